//! Export of folder subtrees as a single archive.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{info, warn};

use filevault_auth::ownership::require_owned;
use filevault_core::error::{AppError, ErrorKind};
use filevault_core::traits::archive::{ArchiveOutput, ArchiveWriterFactory};
use filevault_core::traits::storage::ContentStore;
use filevault_database::repositories::{FileRepository, FolderRepository};

use super::naming::{NameAllocator, sanitize_segment};
use crate::context::RequestContext;
use crate::user::LockVerifier;

/// A finished export.
#[derive(Debug)]
pub struct ArchiveExport {
    /// The archive stream and its size.
    pub output: ArchiveOutput,
    /// Directory and file entries written.
    pub entries: usize,
    /// Files left out because their stored content was missing.
    pub skipped_files: usize,
}

/// Packs one or more owned folders into an archive.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Content store holding file bytes.
    store: Arc<dyn ContentStore>,
    /// Archive writer factory.
    writers: Arc<dyn ArchiveWriterFactory>,
    /// Lock-password gate.
    lock_verifier: Arc<LockVerifier>,
    /// Most folders accepted in one export.
    max_folders: usize,
}

impl ArchiveService {
    /// Creates a new archive service.
    pub fn new(
        folder_repo: Arc<FolderRepository>,
        file_repo: Arc<FileRepository>,
        store: Arc<dyn ContentStore>,
        writers: Arc<dyn ArchiveWriterFactory>,
        lock_verifier: Arc<LockVerifier>,
        max_folders: usize,
    ) -> Self {
        Self {
            folder_repo,
            file_repo,
            store,
            writers,
            lock_verifier,
            max_folders,
        }
    }

    /// Exports the given folders, each as a top-level directory holding its
    /// whole subtree.
    ///
    /// Every folder is checked before anything is written. If any of them
    /// is locked or holds locked folders or files, the lock password (or
    /// `skip_check`) is required and locked content is then included.
    /// Files whose stored content is gone are skipped with a warning.
    pub async fn export_as_archive(
        &self,
        ctx: &RequestContext,
        folder_ids: &[i64],
        password: Option<&str>,
        skip_check: bool,
    ) -> Result<ArchiveExport, AppError> {
        if folder_ids.is_empty() {
            return Err(AppError::validation("At least one folder is required"));
        }
        if folder_ids.len() > self.max_folders {
            return Err(AppError::validation(format!(
                "At most {} folders can be exported at once",
                self.max_folders
            )));
        }

        let mut roots = Vec::with_capacity(folder_ids.len());
        for &folder_id in folder_ids {
            roots.push(require_owned(
                self.folder_repo.find_by_id(folder_id).await?,
                ctx.user_id,
                "Folder",
                folder_id,
            )?);
        }

        let mut locked = false;
        for root in &roots {
            if self.folder_repo.subtree_has_locked(root.id).await? {
                locked = true;
                break;
            }
        }
        if locked {
            self.lock_verifier.verify(ctx, password, skip_check).await?;
        }

        let mut writer = self.writers.create()?;
        let mut entries = 0;
        let mut skipped_files = 0;
        let mut top_level = NameAllocator::new();

        for root in roots {
            let top = top_level.allocate_dir(&sanitize_segment(&root.name));
            let mut visited = HashSet::from([root.id]);
            let mut queue = VecDeque::from([(root.id, format!("{top}/"))]);

            while let Some((folder_id, prefix)) = queue.pop_front() {
                writer.add_directory(&prefix).await?;
                entries += 1;

                let mut names = NameAllocator::new();

                for file in self.file_repo.find_all_in_folder(folder_id).await? {
                    let data = match self.store.read_bytes(&file.location).await {
                        Ok(data) => data,
                        Err(e) if e.kind == ErrorKind::NotFound => {
                            warn!(
                                file_id = file.id,
                                location = %file.location,
                                "Stored content missing, leaving file out of archive"
                            );
                            skipped_files += 1;
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    let entry = names.allocate_file(&sanitize_segment(&file.name));
                    writer.add_file(&format!("{prefix}{entry}"), data).await?;
                    entries += 1;
                }

                for child in self.folder_repo.find_subfolders(folder_id).await? {
                    if visited.insert(child.id) {
                        let entry = names.allocate_dir(&sanitize_segment(&child.name));
                        queue.push_back((child.id, format!("{prefix}{entry}/")));
                    }
                }
            }
        }

        let output = writer.finish().await?;
        info!(
            user_id = ctx.user_id,
            folders = folder_ids.len(),
            entries,
            skipped_files,
            size_bytes = output.size_bytes,
            "Archive exported"
        );

        Ok(ArchiveExport {
            output,
            entries,
            skipped_files,
        })
    }
}
