//! Category entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A label attached to files. Categories without an owner are global.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    /// Unique category identifier.
    pub id: i64,
    /// Category name.
    pub name: String,
    /// Owning user (null for global categories).
    pub user_id: Option<i64>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Whether the category is shared by every user.
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Data required to create a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    /// Category name.
    pub name: String,
    /// Owner (None for a global category).
    pub user_id: Option<i64>,
}
