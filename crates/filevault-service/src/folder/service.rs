//! Folder CRUD, locking and cascading delete with ownership enforcement.

use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use filevault_auth::ownership::require_owned;
use filevault_core::error::{AppError, ErrorKind};
use filevault_core::traits::storage::ContentStore;
use filevault_database::repositories::{FileRepository, FolderRepository};
use filevault_entity::folder::{CreateFolder, Folder, FolderColor, FolderContents, FolderNode};

use super::tree::TreeService;
use crate::context::RequestContext;
use crate::user::LockVerifier;
use crate::validation::normalize_name;

/// What a cascading folder delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    /// Folders removed, including the target.
    pub folders_removed: u64,
    /// File records removed.
    pub files_removed: u64,
    /// Stored contents that could not be deleted (logged, not fatal).
    pub content_failures: u64,
}

/// Manages the folder hierarchy.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Pool used for the cascading delete transaction.
    pool: SqlitePool,
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Tree walks.
    tree: Arc<TreeService>,
    /// Content store holding file bytes.
    store: Arc<dyn ContentStore>,
    /// Lock-password gate.
    lock_verifier: Arc<LockVerifier>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        pool: SqlitePool,
        folder_repo: Arc<FolderRepository>,
        file_repo: Arc<FileRepository>,
        tree: Arc<TreeService>,
        store: Arc<dyn ContentStore>,
        lock_verifier: Arc<LockVerifier>,
    ) -> Self {
        Self {
            pool,
            folder_repo,
            file_repo,
            tree,
            store,
            lock_verifier,
        }
    }

    /// Gets a folder owned by the caller.
    pub async fn get_folder(&self, ctx: &RequestContext, folder_id: i64) -> Result<Folder, AppError> {
        require_owned(
            self.folder_repo.find_by_id(folder_id).await?,
            ctx.user_id,
            "Folder",
            folder_id,
        )
    }

    /// Creates a folder at the top level or under an owned parent.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<i64>,
        color: Option<&str>,
    ) -> Result<Folder, AppError> {
        let name = normalize_name("Folder", name)?;
        let color: FolderColor = match color {
            Some(raw) => raw.parse()?,
            None => FolderColor::default(),
        };

        if let Some(parent_id) = parent_id {
            self.get_folder(ctx, parent_id).await?;
        }

        let folder = self
            .folder_repo
            .create(&CreateFolder {
                name,
                user_id: ctx.user_id,
                parent_id,
                folder_color: color.as_str().to_string(),
                is_locked: false,
                is_important: false,
            })
            .await?;

        info!(
            user_id = ctx.user_id,
            folder_id = folder.id,
            parent_id = ?folder.parent_id,
            "Folder created"
        );
        Ok(folder)
    }

    /// Renames a folder.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
        new_name: &str,
    ) -> Result<Folder, AppError> {
        self.get_folder(ctx, folder_id).await?;
        let name = normalize_name("Folder", new_name)?;

        let folder = self.folder_repo.rename(folder_id, &name).await?;
        info!(user_id = ctx.user_id, folder_id, "Folder renamed");
        Ok(folder)
    }

    /// Changes a folder's color tag.
    pub async fn set_folder_color(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
        color: &str,
    ) -> Result<Folder, AppError> {
        self.get_folder(ctx, folder_id).await?;
        let color: FolderColor = color.parse()?;

        let folder = self.folder_repo.set_color(folder_id, color.as_str()).await?;
        info!(user_id = ctx.user_id, folder_id, color = %color.as_str(), "Folder color changed");
        Ok(folder)
    }

    /// Moves a folder under a new parent, or to the top level with `None`.
    ///
    /// Moving a folder into itself or into one of its descendants is a
    /// `Conflict`.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<Folder, AppError> {
        self.get_folder(ctx, folder_id).await?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == folder_id {
                return Err(AppError::conflict("A folder cannot be moved into itself"));
            }
            let destination = self.get_folder(ctx, parent_id).await?;
            if self.tree.is_same_or_descendant(&destination, folder_id).await? {
                return Err(AppError::conflict(
                    "A folder cannot be moved into one of its own subfolders",
                ));
            }
        }

        let folder = self.folder_repo.set_parent(folder_id, new_parent_id).await?;
        info!(
            user_id = ctx.user_id,
            folder_id,
            parent_id = ?new_parent_id,
            "Folder moved"
        );
        Ok(folder)
    }

    /// Deletes a folder with all descendant folders and files.
    ///
    /// Rows go in one transaction; stored contents are removed after
    /// commit and failures there are only logged.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
    ) -> Result<DeleteSummary, AppError> {
        self.get_folder(ctx, folder_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let locations = self
            .folder_repo
            .subtree_file_locations_in(&mut *tx, folder_id)
            .await?;
        let counts = self.folder_repo.count_subtree_in(&mut *tx, folder_id).await?;
        self.folder_repo.delete_subtree_in(&mut *tx, folder_id).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit folder delete", e)
        })?;

        let mut content_failures = 0;
        for location in &locations {
            if let Err(e) = self.store.delete(location).await {
                warn!(folder_id, location = %location, error = %e, "Failed to delete stored content");
                content_failures += 1;
            }
        }

        let summary = DeleteSummary {
            folders_removed: counts.folders,
            files_removed: counts.files,
            content_failures,
        };
        info!(
            user_id = ctx.user_id,
            folder_id,
            folders = summary.folders_removed,
            files = summary.files_removed,
            "Folder deleted"
        );
        Ok(summary)
    }

    /// Locks a folder. Locking a locked folder changes nothing.
    pub async fn lock_folder(&self, ctx: &RequestContext, folder_id: i64) -> Result<Folder, AppError> {
        let folder = self.get_folder(ctx, folder_id).await?;
        if folder.is_locked {
            return Ok(folder);
        }

        let folder = self.folder_repo.set_locked(folder_id, true).await?;
        info!(user_id = ctx.user_id, folder_id, "Folder locked");
        Ok(folder)
    }

    /// Unlocks a folder after the lock-password check.
    pub async fn unlock_folder(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
        password: Option<&str>,
        skip_check: bool,
    ) -> Result<Folder, AppError> {
        let folder = self.get_folder(ctx, folder_id).await?;
        if !folder.is_locked {
            return Err(AppError::not_applicable(format!(
                "Folder {folder_id} is not locked"
            )));
        }

        self.lock_verifier.verify(ctx, password, skip_check).await?;

        let folder = self.folder_repo.set_locked(folder_id, false).await?;
        info!(user_id = ctx.user_id, folder_id, "Folder unlocked");
        Ok(folder)
    }

    /// Flips the important flag and returns the new value.
    pub async fn toggle_important(&self, ctx: &RequestContext, folder_id: i64) -> Result<bool, AppError> {
        let folder = self.get_folder(ctx, folder_id).await?;
        let updated = self
            .folder_repo
            .set_important(folder_id, !folder.is_important)
            .await?;

        info!(
            user_id = ctx.user_id,
            folder_id,
            important = updated.is_important,
            "Folder important flag toggled"
        );
        Ok(updated.is_important)
    }

    /// Lists the caller's folders directly under `parent_id` (None = top
    /// level), newest first.
    pub async fn list_folders(
        &self,
        ctx: &RequestContext,
        parent_id: Option<i64>,
    ) -> Result<Vec<Folder>, AppError> {
        if let Some(parent_id) = parent_id {
            self.get_folder(ctx, parent_id).await?;
        }
        self.folder_repo.find_children(ctx.user_id, parent_id).await
    }

    /// Gets a folder with its unlocked subfolders and files.
    ///
    /// A locked folder needs the lock password (or a verified session).
    pub async fn get_folder_with_contents(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
        password: Option<&str>,
    ) -> Result<FolderContents, AppError> {
        let folder = self.get_folder(ctx, folder_id).await?;
        if folder.is_locked {
            self.lock_verifier.verify(ctx, password, false).await?;
        }

        let subfolders = self.folder_repo.find_unlocked_children(folder_id).await?;
        let files = self
            .file_repo
            .find_unlocked_in_folder(ctx.user_id, Some(folder_id))
            .await?;

        Ok(FolderContents {
            folder,
            subfolders,
            files,
        })
    }

    /// Ancestors from the top level down to the immediate parent.
    pub async fn get_parent_chain(
        &self,
        ctx: &RequestContext,
        folder_id: i64,
    ) -> Result<Vec<Folder>, AppError> {
        self.tree.get_parent_chain(ctx, folder_id).await
    }

    /// Nested view of a folder's subtree.
    pub async fn get_tree(&self, ctx: &RequestContext, folder_id: i64) -> Result<FolderNode, AppError> {
        self.tree.get_tree(ctx, folder_id).await
    }
}
