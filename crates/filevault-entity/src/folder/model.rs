//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A folder in a user's hierarchy.
///
/// The root is not a row: a folder with `parent_id = None` sits at the
/// top level of its owner's tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: i64,
    /// Folder name. Siblings may share a name.
    pub name: String,
    /// The folder owner.
    pub user_id: i64,
    /// Parent folder ID (null for top-level folders).
    pub parent_id: Option<i64>,
    /// Whether the folder contents are hidden behind the lock password.
    pub is_locked: bool,
    /// Optional per-folder lock password hash (unused by unlock checks).
    #[serde(skip_serializing)]
    pub lock_password: Option<String>,
    /// Whether the owner flagged the folder as important.
    pub is_important: bool,
    /// Color tag.
    pub folder_color: String,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is a top-level folder (no parent).
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Folder name (already validated).
    pub name: String,
    /// The folder owner.
    pub user_id: i64,
    /// Parent folder (None for top level).
    pub parent_id: Option<i64>,
    /// Color tag.
    pub folder_color: String,
    /// Initial lock state.
    pub is_locked: bool,
    /// Initial important flag.
    pub is_important: bool,
}
