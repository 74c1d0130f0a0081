use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{OffsetDateTime, Time};

use crate::error::LedgerError;
use crate::formats;

/// User record as stored in `users` and mirrored in memory.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub passport_serie: i32,
    pub passport_number: i32,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub address: String,
    pub timezone: String,
    #[serde(with = "formats::wall_time_option")]
    pub default_end_time: Option<Time>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_checked_at: Option<OffsetDateTime>,
}

impl User {
    pub fn key(&self) -> PassportKey {
        PassportKey {
            serie: self.passport_serie,
            number: self.passport_number,
        }
    }
}

/// Natural key of a user: passport series and number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassportKey {
    pub serie: i32,
    pub number: i32,
}

impl fmt::Display for PassportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.serie, self.number)
    }
}

impl FromStr for PassportKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref PASSPORT_RE: Regex = Regex::new(r"^\s*(\d{1,9})\s+(\d{1,9})\s*$").unwrap();
        }
        let caps = PASSPORT_RE
            .captures(s)
            .ok_or_else(|| LedgerError::BadRequest("invalid passport number format".into()))?;
        let serie = caps[1]
            .parse()
            .map_err(|_| LedgerError::BadRequest("invalid passport series".into()))?;
        let number = caps[2]
            .parse()
            .map_err(|_| LedgerError::BadRequest("invalid passport number".into()))?;
        Ok(Self { serie, number })
    }
}

/// Fields needed to register a user; the surrogate id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub key: PassportKey,
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub address: String,
    pub timezone: String,
    pub default_end_time: Option<Time>,
    pub password_hash: Option<String>,
}

impl NewUser {
    pub fn new(key: PassportKey, timezone: impl Into<String>) -> Self {
        Self {
            key,
            surname: String::new(),
            name: String::new(),
            patronymic: String::new(),
            address: String::new(),
            timezone: timezone.into(),
            default_end_time: None,
            password_hash: None,
        }
    }
}

/// Partial user update. Absent fields are left untouched; strings set to ""
/// clear the field, `default_end_time: Some(None)` clears the end time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "patch_end_time")]
    pub default_end_time: Option<Option<Time>>,
    #[serde(skip)]
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.surname.is_none()
            && self.name.is_none()
            && self.patronymic.is_none()
            && self.address.is_none()
            && self.timezone.is_none()
            && self.default_end_time.is_none()
            && self.password_hash.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.surname {
            user.surname = v.clone();
        }
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.patronymic {
            user.patronymic = v.clone();
        }
        if let Some(v) = &self.address {
            user.address = v.clone();
        }
        if let Some(v) = &self.timezone {
            user.timezone = v.clone();
        }
        if let Some(v) = self.default_end_time {
            user.default_end_time = v;
        }
        if let Some(v) = &self.password_hash {
            user.password_hash = Some(v.clone());
        }
    }
}

// A present-but-null JSON value must become `Some(None)`, which plain
// `Option<Option<_>>` deserialization collapses into `None`.
fn patch_end_time<'de, D>(d: D) -> Result<Option<Option<Time>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    formats::wall_time_option::deserialize(d).map(Some)
}

/// Per-field predicates for listing users: exact match on passport parts,
/// substring match on text fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub passport_serie: Option<i32>,
    pub passport_number: Option<i32>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, u: &User) -> bool {
        fn contains(needle: &Option<String>, hay: &str) -> bool {
            needle.as_deref().map_or(true, |n| hay.contains(n))
        }
        self.passport_serie.map_or(true, |s| s == u.passport_serie)
            && self.passport_number.map_or(true, |n| n == u.passport_number)
            && contains(&self.surname, &u.surname)
            && contains(&self.name, &u.name)
            && contains(&self.patronymic, &u.patronymic)
            && contains(&self.address, &u.address)
            && contains(&self.timezone, &u.timezone)
    }
}

/// Profile data supplied by the external directory for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExtUserData {
    #[serde(default)]
    pub passport_serie: i32,
    #[serde(default)]
    pub passport_number: i32,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

impl ExtUserData {
    pub fn key(&self) -> PassportKey {
        PassportKey {
            serie: self.passport_serie,
            number: self.passport_number,
        }
    }
}
