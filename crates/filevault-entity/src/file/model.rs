//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A file record. The bytes live in the content store under `location`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: i64,
    /// The file name (including extension).
    pub name: String,
    /// Content store location reference.
    pub location: String,
    /// File size in bytes.
    pub size: i64,
    /// MIME type of the file.
    pub mime_type: String,
    /// Whether the file is hidden behind the lock password.
    pub is_locked: bool,
    /// The containing folder (null for the root).
    pub folder_id: Option<i64>,
    /// The file owner.
    pub user_id: i64,
    /// Assigned category, if any.
    pub category_id: Option<i64>,
    /// Cached document summary.
    pub summary: Option<String>,
    /// When the cached summary was produced.
    pub summary_generated_at: Option<DateTime<Utc>>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The file name.
    pub name: String,
    /// Content store location.
    pub location: String,
    /// File size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Initial lock state.
    pub is_locked: bool,
    /// Destination folder (None for root).
    pub folder_id: Option<i64>,
    /// The file owner.
    pub user_id: i64,
    /// Category to attach.
    pub category_id: Option<i64>,
}
