//! User repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::user::{CreateUser, User};

use super::map_db_error;

const USER_COLUMNS: &str = "id, name, email, password_hash, lock_password_hash, is_active, \
                            last_login, created_at, updated_at";

/// Repository for user CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by email", e))
    }

    /// List every user ordered by id.
    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }

    /// Create a new user. A duplicate email yields `Conflict`.
    pub async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, 1, ?, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to create user", e))
    }

    /// Store (or clear) the account lock-password hash.
    pub async fn update_lock_password(&self, user_id: i64, hash: Option<&str>) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET lock_password_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update lock password", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(())
    }

    /// Set the active flag.
    pub async fn set_active(&self, user_id: i64, active: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(active)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user", e))?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    /// Update last login timestamp.
    pub async fn update_last_login(&self, user_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last login", e)
            })?;
        Ok(())
    }

    /// Count users.
    pub async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabasePool, migration};
    use filevault_core::config::DatabaseConfig;

    async fn repo() -> UserRepository {
        let db = DatabasePool::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        migration::run_migrations(db.pool()).await.unwrap();
        UserRepository::new(db.into_pool())
    }

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Grace".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_regardless_of_case() {
        let repo = repo().await;
        repo.create(&new_user("grace@example.com")).await.unwrap();

        let err = repo.create(&new_user("GRACE@example.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lock_password_roundtrip() {
        let repo = repo().await;
        let user = repo.create(&new_user("g@example.com")).await.unwrap();
        assert!(!user.has_lock_password());

        repo.update_lock_password(user.id, Some("lock-hash"))
            .await
            .unwrap();
        let found = repo.find_by_email("G@EXAMPLE.COM").await.unwrap().unwrap();
        assert_eq!(found.lock_password_hash.as_deref(), Some("lock-hash"));

        let err = repo.update_lock_password(42, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
