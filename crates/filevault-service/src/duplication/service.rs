//! Recursive duplication of files and folder subtrees.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use filevault_auth::ownership::require_owned;
use filevault_core::error::{AppError, ErrorKind};
use filevault_core::traits::storage::ContentStore;
use filevault_database::repositories::{FileRepository, FolderRepository};
use filevault_entity::file::{CreateFile, File};
use filevault_entity::folder::{CreateFolder, Folder};
use filevault_entity::item::ItemKind;

use crate::context::RequestContext;
use crate::folder::TreeService;
use crate::user::LockVerifier;

/// Suffix appended to the name of every duplicated item.
pub const COPY_SUFFIX: &str = " (Copy)";

/// The top-level item produced by a duplication.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "item", rename_all = "lowercase")]
pub enum DuplicatedItem {
    /// A copied file.
    File(File),
    /// The copied root folder.
    Folder(Folder),
}

/// Outcome of a duplication.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicationResult {
    /// The new top-level item.
    pub item: DuplicatedItem,
    /// Folders created, including the copied root.
    pub folders_copied: u64,
    /// Files created.
    pub files_copied: u64,
}

#[derive(Default)]
struct Progress {
    written: Vec<String>,
    folders: u64,
    files: u64,
}

/// Copies files and whole folder subtrees in one transaction.
#[derive(Debug, Clone)]
pub struct DuplicationService {
    /// Pool the copy transaction is taken from.
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

/// Name given to a duplicated item.
pub fn copy_name(original: &str) -> String {
    format!("{original}{COPY_SUFFIX}")
}

impl DuplicationService {
    /// Creates a new duplication service.
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

    /// Duplicates a file or folder into `destination_folder_id`.
    ///
    /// Without a destination the copy is placed next to the source. A
    /// folder cannot be copied into its own subtree (`Conflict`). On any
    /// failure nothing is persisted and content written so far is removed.
    ///
    /// Copies come out unlocked, so a source that is locked or holds
    /// anything locked needs the lock password (or `skip_check`).
    pub async fn duplicate(
        &self,
        ctx: &RequestContext,
        item_id: i64,
        kind: ItemKind,
        destination_folder_id: Option<i64>,
        password: Option<&str>,
        skip_check: bool,
    ) -> Result<DuplicationResult, AppError> {
        enum Source {
            File(File),
            Folder(Folder),
        }

        let source = match kind {
            ItemKind::File => Source::File(require_owned(
                self.file_repo.find_by_id(item_id).await?,
                ctx.user_id,
                "File",
                item_id,
            )?),
            ItemKind::Folder => Source::Folder(require_owned(
                self.folder_repo.find_by_id(item_id).await?,
                ctx.user_id,
                "Folder",
                item_id,
            )?),
        };

        let locked = match &source {
            Source::File(file) => file.is_locked,
            Source::Folder(folder) => self.folder_repo.subtree_has_locked(folder.id).await?,
        };
        if locked {
            self.lock_verifier.verify(ctx, password, skip_check).await?;
        }

        let destination = match destination_folder_id {
            Some(id) => Some(require_owned(
                self.folder_repo.find_by_id(id).await?,
                ctx.user_id,
                "Folder",
                id,
            )?),
            None => None,
        };

        if let (Source::Folder(folder), Some(dest)) = (&source, &destination) {
            if self.tree.is_same_or_descendant(dest, folder.id).await? {
                return Err(AppError::conflict(
                    "A folder cannot be copied into its own subtree",
                ));
            }
        }

        let target = match (&source, &destination) {
            (_, Some(dest)) => Some(dest.id),
            (Source::File(file), None) => file.folder_id,
            (Source::Folder(folder), None) => folder.parent_id,
        };

        let mut progress = Progress::default();
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let copied = match &source {
            Source::File(file) => self
                .copy_file(&mut *tx, ctx, file, target, &mut progress)
                .await
                .map(DuplicatedItem::File),
            Source::Folder(folder) => self
                .copy_folder(&mut *tx, ctx, folder, target, &mut progress)
                .await
                .map(DuplicatedItem::Folder),
        };

        let item = match copied {
            Ok(item) => item,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Failed to roll back duplication");
                }
                self.discard(&progress.written).await;
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            self.discard(&progress.written).await;
            return Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to commit duplication",
                e,
            ));
        }

        info!(
            user_id = ctx.user_id,
            item_id,
            kind = %kind,
            folders = progress.folders,
            files = progress.files,
            "Item duplicated"
        );

        Ok(DuplicationResult {
            item,
            folders_copied: progress.folders,
            files_copied: progress.files,
        })
    }

    async fn copy_file(
        &self,
        conn: &mut SqliteConnection,
        ctx: &RequestContext,
        file: &File,
        folder_id: Option<i64>,
        progress: &mut Progress,
    ) -> Result<File, AppError> {
        let location = self.store.copy(&file.location).await?;
        progress.written.push(location.clone());

        let copy = self
            .file_repo
            .create_in(
                conn,
                &CreateFile {
                    name: copy_name(&file.name),
                    location,
                    size: file.size,
                    mime_type: file.mime_type.clone(),
                    is_locked: false,
                    folder_id,
                    user_id: ctx.user_id,
                    category_id: file.category_id,
                },
            )
            .await?;
        progress.files += 1;
        Ok(copy)
    }

    async fn copy_folder(
        &self,
        conn: &mut SqliteConnection,
        ctx: &RequestContext,
        folder: &Folder,
        parent_id: Option<i64>,
        progress: &mut Progress,
    ) -> Result<Folder, AppError> {
        let root_copy = self
            .create_folder_copy(conn, ctx, folder, parent_id, progress)
            .await?;

        let mut visited = HashSet::from([folder.id, root_copy.id]);
        let mut queue = VecDeque::from([(folder.id, root_copy.id)]);

        while let Some((source_id, copy_id)) = queue.pop_front() {
            for file in self.file_repo.find_all_in_folder_in(conn, source_id).await? {
                self.copy_file(conn, ctx, &file, Some(copy_id), progress)
                    .await?;
            }

            for child in self.folder_repo.find_subfolders_in(conn, source_id).await? {
                if !visited.insert(child.id) {
                    continue;
                }
                let child_copy = self
                    .create_folder_copy(conn, ctx, &child, Some(copy_id), progress)
                    .await?;
                visited.insert(child_copy.id);
                queue.push_back((child.id, child_copy.id));
            }
        }

        Ok(root_copy)
    }

    async fn create_folder_copy(
        &self,
        conn: &mut SqliteConnection,
        ctx: &RequestContext,
        folder: &Folder,
        parent_id: Option<i64>,
        progress: &mut Progress,
    ) -> Result<Folder, AppError> {
        let copy = self
            .folder_repo
            .create_in(
                conn,
                &CreateFolder {
                    name: copy_name(&folder.name),
                    user_id: ctx.user_id,
                    parent_id,
                    folder_color: folder.folder_color.clone(),
                    is_locked: false,
                    is_important: false,
                },
            )
            .await?;
        progress.folders += 1;
        Ok(copy)
    }

    async fn discard(&self, locations: &[String]) {
        for location in locations {
            if let Err(e) = self.store.delete(location).await {
                warn!(location = %location, error = %e, "Failed to remove duplicated content");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_name() {
        assert_eq!(copy_name("Docs"), "Docs (Copy)");
        assert_eq!(copy_name("a.txt"), "a.txt (Copy)");
        assert_eq!(copy_name("Docs (Copy)"), "Docs (Copy) (Copy)");
    }
}
