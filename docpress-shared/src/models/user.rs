//! Accounts and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Global role assignment for a user account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular account.
    #[default]
    User,
    /// Account allowed into the admin area.
    Admin,
}

impl UserRole {
    /// Return the canonical string representation used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err("unknown user role"),
        }
    }
}

/// Profile of an authenticated account as returned by `users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier for the user.
    pub id: i64,

    /// The user's login name.
    pub username: String,

    /// Global role.
    pub role: UserRole,

    /// Whether the account is enabled.
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

/// Credentials submitted to `auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plain-text password; sent over the wire only.
    pub password: String,
}

/// Details submitted to `auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Requested login name.
    pub username: String,
    /// Initial password.
    pub password: String,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer credential for subsequent requests.
    pub access_token: String,

    /// Always `bearer` for this backend.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime of the token in seconds.
    #[serde(default)]
    pub expires_in: i64,

    /// The authenticated account.
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
