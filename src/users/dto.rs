use serde::Deserialize;
use time::Time;

use super::repo_types::UserFilter;
use crate::formats;
use crate::repository::Pagination;

/// Body of `POST /users`. Users created here have no password and cannot
/// log in until one is set through registration.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "passportNumber")]
    pub passport: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub patronymic: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default, with = "formats::wall_time_option")]
    pub default_end_time: Option<Time>,
}

/// Query string of `GET /users`: filter fields plus the page window.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub passport_serie: Option<i32>,
    pub passport_number: Option<i32>,
    pub surname: Option<String>,
    pub name: Option<String>,
    pub patronymic: Option<String>,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl UserListQuery {
    pub fn split(self) -> (UserFilter, Pagination) {
        let defaults = Pagination::default();
        let page = Pagination {
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        };
        let filter = UserFilter {
            passport_serie: self.passport_serie,
            passport_number: self.passport_number,
            surname: self.surname,
            name: self.name,
            patronymic: self.patronymic,
            address: self.address,
            timezone: self.timezone,
        };
        (filter, page)
    }
}
