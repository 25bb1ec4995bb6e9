//! Folder repository implementation.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_entity::folder::{CreateFolder, Folder};

const FOLDER_COLUMNS: &str = "id, name, user_id, parent_id, is_locked, lock_password, \
                              is_important, folder_color, created_at";

/// Counts of what a subtree delete removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtreeCounts {
    /// Folders in the subtree, including its root.
    pub folders: u64,
    /// Files anywhere in the subtree.
    pub files: u64,
}

/// Repository for folder CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: SqlitePool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a folder by ID on an existing connection.
    pub async fn find_by_id_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// List a user's folders directly under `parent_id` (None = top level),
    /// newest first.
    pub async fn find_children(
        &self,
        user_id: i64,
        parent_id: Option<i64>,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? AND parent_id IS ? \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))
    }

    /// List unlocked child folders of a folder, newest first.
    pub async fn find_unlocked_children(&self, parent_id: i64) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id = ? AND is_locked = 0 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list subfolders", e))
    }

    /// List every child folder of a folder in creation order.
    pub async fn find_subfolders(&self, parent_id: i64) -> AppResult<Vec<Folder>> {
        let mut conn = self.acquire().await?;
        self.find_subfolders_in(&mut conn, parent_id).await
    }

    /// List every child folder of a folder in creation order, on an
    /// existing connection.
    pub async fn find_subfolders_in(
        &self,
        conn: &mut SqliteConnection,
        parent_id: i64,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id = ? ORDER BY id ASC"
        ))
        .bind(parent_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list subfolders", e))
    }

    /// Create a new folder.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        let mut conn = self.acquire().await?;
        self.create_in(&mut conn, data).await
    }

    /// Create a new folder on an existing connection.
    pub async fn create_in(
        &self,
        conn: &mut SqliteConnection,
        data: &CreateFolder,
    ) -> AppResult<Folder> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "INSERT INTO folders (name, user_id, parent_id, is_locked, is_important, \
             folder_color, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(&data.name)
        .bind(data.user_id)
        .bind(data.parent_id)
        .bind(data.is_locked)
        .bind(data.is_important)
        .bind(&data.folder_color)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))?;

        debug!(folder_id = folder.id, parent_id = ?folder.parent_id, "Inserted folder row");
        Ok(folder)
    }

    /// Rename a folder.
    pub async fn rename(&self, folder_id: i64, new_name: &str) -> AppResult<Folder> {
        self.update_returning(
            "UPDATE folders SET name = ? WHERE id = ?",
            folder_id,
            new_name.to_string(),
            "Failed to rename folder",
        )
        .await
    }

    /// Change a folder's color tag.
    pub async fn set_color(&self, folder_id: i64, color: &str) -> AppResult<Folder> {
        self.update_returning(
            "UPDATE folders SET folder_color = ? WHERE id = ?",
            folder_id,
            color.to_string(),
            "Failed to update folder color",
        )
        .await
    }

    /// Re-parent a folder (None = top level).
    pub async fn set_parent(&self, folder_id: i64, parent_id: Option<i64>) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders SET parent_id = ? WHERE id = ? RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(parent_id)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move folder", e))?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Set the locked flag.
    pub async fn set_locked(&self, folder_id: i64, locked: bool) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders SET is_locked = ? WHERE id = ? RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(locked)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder lock", e))?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Set the important flag.
    pub async fn set_important(&self, folder_id: i64, important: bool) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders SET is_important = ? WHERE id = ? RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(important)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update important flag", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    /// Storage locations of every file in the subtree rooted at `folder_id`.
    pub async fn subtree_file_locations_in(
        &self,
        conn: &mut SqliteConnection,
        folder_id: i64,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "WITH RECURSIVE tree(id) AS ( \
                SELECT id FROM folders WHERE id = ? \
                UNION \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) SELECT location FROM files WHERE folder_id IN (SELECT id FROM tree)",
        )
        .bind(folder_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to collect subtree files", e)
        })
    }

    /// Count folders and files in the subtree rooted at `folder_id`.
    pub async fn count_subtree_in(
        &self,
        conn: &mut SqliteConnection,
        folder_id: i64,
    ) -> AppResult<SubtreeCounts> {
        let (folders, files): (i64, i64) = sqlx::query_as(
            "WITH RECURSIVE tree(id) AS ( \
                SELECT id FROM folders WHERE id = ? \
                UNION \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) SELECT (SELECT COUNT(*) FROM tree), \
                      (SELECT COUNT(*) FROM files WHERE folder_id IN (SELECT id FROM tree))",
        )
        .bind(folder_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count subtree", e))?;

        Ok(SubtreeCounts {
            folders: folders as u64,
            files: files as u64,
        })
    }

    /// Whether any folder or file in the subtree rooted at `folder_id`,
    /// the root included, is locked.
    pub async fn subtree_has_locked(&self, folder_id: i64) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "WITH RECURSIVE tree(id) AS ( \
                SELECT id FROM folders WHERE id = ? \
                UNION \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) SELECT EXISTS (SELECT 1 FROM folders WHERE is_locked = 1 \
                                AND id IN (SELECT id FROM tree)) \
                   OR EXISTS (SELECT 1 FROM files WHERE is_locked = 1 \
                                AND folder_id IN (SELECT id FROM tree))",
        )
        .bind(folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check subtree locks", e))
    }

    /// Delete a folder with its whole subtree on an existing connection.
    ///
    /// Files go first in one statement, then folders leaf-first, so no
    /// single delete cascades more than one level regardless of depth.
    pub async fn delete_subtree_in(
        &self,
        conn: &mut SqliteConnection,
        folder_id: i64,
    ) -> AppResult<bool> {
        let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(
            "WITH RECURSIVE tree(id) AS ( \
                SELECT id FROM folders WHERE id = ? \
                UNION \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) SELECT id, parent_id FROM folders WHERE id IN (SELECT id FROM tree)",
        )
        .bind(folder_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to collect subtree", e))?;

        if rows.is_empty() {
            return Ok(false);
        }

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for (id, parent_id) in &rows {
            if let Some(parent_id) = parent_id {
                children.entry(*parent_id).or_default().push(*id);
            }
        }

        let mut order = vec![folder_id];
        let mut visited = HashSet::from([folder_id]);
        let mut next = 0;
        while next < order.len() {
            let id = order[next];
            next += 1;
            for &child in children.get(&id).into_iter().flatten() {
                if visited.insert(child) {
                    order.push(child);
                }
            }
        }

        sqlx::query(
            "WITH RECURSIVE tree(id) AS ( \
                SELECT id FROM folders WHERE id = ? \
                UNION \
                SELECT f.id FROM folders f INNER JOIN tree t ON f.parent_id = t.id \
             ) DELETE FROM files WHERE folder_id IN (SELECT id FROM tree)",
        )
        .bind(folder_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete subtree files", e))?;

        for id in order.iter().rev() {
            sqlx::query("DELETE FROM folders WHERE id = ?")
                .bind(id)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete folder", e)
                })?;
        }

        debug!(folder_id, folders = order.len(), "Deleted folder subtree");
        Ok(true)
    }

    /// Count files directly in a folder.
    pub async fn count_files(&self, folder_id: i64) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;
        Ok(count as u64)
    }

    async fn update_returning(
        &self,
        statement: &str,
        folder_id: i64,
        value: String,
        context: &'static str,
    ) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(&format!("{statement} RETURNING {FOLDER_COLUMNS}"))
            .bind(value)
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, context, e))?
            .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))
    }

    async fn acquire(&self) -> AppResult<sqlx::pool::PoolConnection<sqlx::Sqlite>> {
        self.pool.acquire().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to acquire connection", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::UserRepository;
    use crate::{DatabasePool, migration};
    use filevault_core::config::DatabaseConfig;
    use filevault_entity::user::CreateUser;

    async fn setup() -> (SqlitePool, i64) {
        let db = DatabasePool::connect(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        migration::run_migrations(db.pool()).await.unwrap();
        let user = UserRepository::new(db.pool().clone())
            .create(&CreateUser {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        (db.into_pool(), user.id)
    }

    fn new_folder(user_id: i64, name: &str, parent_id: Option<i64>) -> CreateFolder {
        CreateFolder {
            name: name.into(),
            user_id,
            parent_id,
            folder_color: "blue".into(),
            is_locked: false,
            is_important: false,
        }
    }

    #[tokio::test]
    async fn test_children_are_newest_first() {
        let (pool, user_id) = setup().await;
        let repo = FolderRepository::new(pool);

        let a = repo.create(&new_folder(user_id, "a", None)).await.unwrap();
        let b = repo.create(&new_folder(user_id, "b", None)).await.unwrap();
        repo.create(&new_folder(user_id, "c", Some(a.id))).await.unwrap();

        let top: Vec<i64> = repo
            .find_children(user_id, None)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(top, vec![b.id, a.id]);
        assert_eq!(repo.find_children(user_id, Some(a.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_subtree() {
        let (pool, user_id) = setup().await;
        let repo = FolderRepository::new(pool.clone());

        let root = repo.create(&new_folder(user_id, "root", None)).await.unwrap();
        let child = repo
            .create(&new_folder(user_id, "child", Some(root.id)))
            .await
            .unwrap();
        repo.create(&new_folder(user_id, "leaf", Some(child.id)))
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let counts = repo.count_subtree_in(&mut conn, root.id).await.unwrap();
        assert_eq!(counts, SubtreeCounts { folders: 3, files: 0 });

        assert!(repo.delete_subtree_in(&mut conn, root.id).await.unwrap());
        assert!(!repo.delete_subtree_in(&mut conn, root.id).await.unwrap());
        drop(conn);
        assert!(repo.find_by_id(child.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subtree_has_locked_sees_nested_folders() {
        let (pool, user_id) = setup().await;
        let repo = FolderRepository::new(pool);

        let root = repo.create(&new_folder(user_id, "root", None)).await.unwrap();
        let child = repo
            .create(&new_folder(user_id, "child", Some(root.id)))
            .await
            .unwrap();
        assert!(!repo.subtree_has_locked(root.id).await.unwrap());

        repo.set_locked(child.id, true).await.unwrap();
        assert!(repo.subtree_has_locked(root.id).await.unwrap());
        assert!(repo.subtree_has_locked(child.id).await.unwrap());
    }
}
