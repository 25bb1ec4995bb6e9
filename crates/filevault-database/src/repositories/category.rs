//! Category repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::category::{Category, CreateCategory};

const CATEGORY_COLUMNS: &str = "id, name, user_id, created_at";

/// Repository for global and per-user categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Create a new category repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find category", e))
    }

    /// List global categories plus those owned by `user_id`, by name.
    pub async fn find_visible(&self, user_id: i64) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id IS NULL OR user_id = ? \
             ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list categories", e))
    }

    /// List global categories only.
    pub async fn find_global(&self) -> AppResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE user_id IS NULL \
             ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list global categories", e)
        })
    }

    /// Create a category.
    pub async fn create(&self, data: &CreateCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, user_id, created_at) VALUES (?, ?, ?) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(data.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create category", e))
    }

    /// Rename a category.
    pub async fn rename(&self, category_id: i64, new_name: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET name = ? WHERE id = ? RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(new_name)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename category", e))?
        .ok_or_else(|| AppError::not_found(format!("Category {category_id} not found")))
    }

    /// Delete a category. Files pointing at it become uncategorized.
    pub async fn delete(&self, category_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete category", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
