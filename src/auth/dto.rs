use serde::{Deserialize, Serialize};
use time::Time;

use crate::formats;
use crate::users::repo_types::User;

/// Request body for registration. The login is the passport string
/// `"<serie> <number>"`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "passportNumber", alias = "login")]
    pub passport: String,
    pub password: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default, with = "formats::wall_time_option")]
    pub default_end_time: Option<Time>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "passportNumber", alias = "login")]
    pub passport: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}
