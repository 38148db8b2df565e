use serde::{Deserialize, Serialize};

use super::claims::Role;

/// Login request body. Field names follow the OAuth2 password-grant form
/// convention, `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub role: Role,
}
