use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::timestamp;

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Identity record returned by `/auth/me` and `/auth/register`.
///
/// Read-only on the client; it only changes by fetching it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginData {
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterData {
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Between 3 and 50 characters, alphanumeric, underscores or hyphens.
    #[validate(
        length(min = 3, max = 50),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    /// Between 8 and 100 characters.
    #[validate(length(min = 8, max = 100))]
    pub password: String,
}

impl RegisterData {
    /// The credentials used to sign in right after registering.
    pub fn credentials(&self) -> LoginData {
        LoginData {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}
