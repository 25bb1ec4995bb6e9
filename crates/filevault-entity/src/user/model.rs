//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account. Owns folders, files and private categories.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address, unique regardless of case.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Argon2 hash of the account-level lock password, if one was set.
    #[serde(skip_serializing)]
    pub lock_password_hash: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Last successful login time.
    pub last_login: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether a lock password has been configured for this account.
    pub fn has_lock_password(&self) -> bool {
        self.lock_password_hash.is_some()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name.
    pub name: String,
    /// Email address (already normalized).
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
}
