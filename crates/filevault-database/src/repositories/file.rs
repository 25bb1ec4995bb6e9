//! File repository implementation.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::file::{CreateFile, File};

const FILE_COLUMNS: &str = "id, name, location, size, mime_type, is_locked, folder_id, user_id, \
                            category_id, summary, summary_generated_at, created_at, updated_at";

/// Repository for file records.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Find a file by ID on an existing connection.
    pub async fn find_by_id_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// List a user's unlocked files in a folder (None = top level), newest first.
    pub async fn find_unlocked_in_folder(
        &self,
        user_id: i64,
        folder_id: Option<i64>,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files \
             WHERE user_id = ? AND folder_id IS ? AND is_locked = 0 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// List every file directly inside a folder, in creation order.
    pub async fn find_all_in_folder(&self, folder_id: i64) -> AppResult<Vec<File>> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        self.find_all_in_folder_in(&mut conn, folder_id).await
    }

    /// List every file directly inside a folder on an existing connection.
    pub async fn find_all_in_folder_in(
        &self,
        conn: &mut SqliteConnection,
        folder_id: i64,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE folder_id = ? ORDER BY id ASC"
        ))
        .bind(folder_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folder files", e))
    }

    /// List all locked files of a user, newest first.
    pub async fn find_locked(&self, user_id: i64) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? AND is_locked = 1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list locked files", e))
    }

    /// List a user's files whose category name matches (case-insensitive).
    pub async fn find_by_category_name(&self, user_id: i64, name: &str) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? AND category_id IN \
             (SELECT id FROM categories WHERE name = ? COLLATE NOCASE) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list files by category", e)
        })
    }

    /// List a user's files without a category.
    pub async fn find_uncategorized(&self, user_id: i64) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? AND category_id IS NULL \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list uncategorized files", e)
        })
    }

    /// Create a new file record.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })?;
        self.create_in(&mut conn, data).await
    }

    /// Create a new file record on an existing connection.
    pub async fn create_in(&self, conn: &mut SqliteConnection, data: &CreateFile) -> AppResult<File> {
        let now = Utc::now();
        let file = sqlx::query_as::<_, File>(&format!(
            "INSERT INTO files (name, location, size, mime_type, is_locked, folder_id, user_id, \
             category_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {FILE_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(&data.location)
        .bind(data.size)
        .bind(&data.mime_type)
        .bind(data.is_locked)
        .bind(data.folder_id)
        .bind(data.user_id)
        .bind(data.category_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))?;

        debug!(file_id = file.id, folder_id = ?file.folder_id, "Inserted file row");
        Ok(file)
    }

    /// Move a file to another folder (None = top level).
    pub async fn move_file(&self, file_id: i64, folder_id: Option<i64>) -> AppResult<File> {
        sqlx::query_as::<_, File>(&format!(
            "UPDATE files SET folder_id = ?, updated_at = ? WHERE id = ? RETURNING {FILE_COLUMNS}"
        ))
        .bind(folder_id)
        .bind(Utc::now())
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move file", e))?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Rename a file.
    pub async fn rename(&self, file_id: i64, new_name: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>(&format!(
            "UPDATE files SET name = ?, updated_at = ? WHERE id = ? RETURNING {FILE_COLUMNS}"
        ))
        .bind(new_name)
        .bind(Utc::now())
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename file", e))?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Set the locked flag.
    pub async fn set_locked(&self, file_id: i64, locked: bool) -> AppResult<File> {
        sqlx::query_as::<_, File>(&format!(
            "UPDATE files SET is_locked = ?, updated_at = ? WHERE id = ? RETURNING {FILE_COLUMNS}"
        ))
        .bind(locked)
        .bind(Utc::now())
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file lock", e))?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Assign or clear the file's category.
    pub async fn set_category(&self, file_id: i64, category_id: Option<i64>) -> AppResult<File> {
        sqlx::query_as::<_, File>(&format!(
            "UPDATE files SET category_id = ?, updated_at = ? WHERE id = ? RETURNING {FILE_COLUMNS}"
        ))
        .bind(category_id)
        .bind(Utc::now())
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update file category", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Store a generated summary for the file.
    pub async fn set_summary(&self, file_id: i64, summary: &str) -> AppResult<File> {
        let now = Utc::now();
        sqlx::query_as::<_, File>(&format!(
            "UPDATE files SET summary = ?, summary_generated_at = ?, updated_at = ? \
             WHERE id = ? RETURNING {FILE_COLUMNS}"
        ))
        .bind(summary)
        .bind(now)
        .bind(now)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store summary", e))?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Delete a file record.
    pub async fn delete(&self, file_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all files of a user.
    pub async fn count_for_user(&self, user_id: i64) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;
        Ok(count as u64)
    }
}
