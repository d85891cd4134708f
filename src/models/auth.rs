//! Authentication-related models

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Registration request
///
/// The password is held as a [`SecretString`]: zeroized on drop and
/// redacted from `Debug` output.
#[derive(Debug, Deserialize, validator::Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    pub password: SecretString,
    #[validate(email, length(max = 255))]
    pub email: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: super::user::UserResponse,
}
