//! File placement: upload recording, moves, locking and categorization.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use filevault_auth::ownership::{require_owned, require_readable};
use filevault_core::error::AppError;
use filevault_core::traits::storage::{ByteStream, ContentStore};
use filevault_database::repositories::{CategoryRepository, FileRepository, FolderRepository};
use filevault_entity::file::{CreateFile, File};
use filevault_storage::mime;

use super::upload::{UploadContent, UploadRequest, cap_stream};
use crate::context::RequestContext;
use crate::user::LockVerifier;
use crate::validation::normalize_name;

/// Handles file records and their stored content.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Folder repository (destination checks).
    folder_repo: Arc<FolderRepository>,
    /// Category repository.
    category_repo: Arc<CategoryRepository>,
    /// Content store holding file bytes.
    store: Arc<dyn ContentStore>,
    /// Lock-password gate.
    lock_verifier: Arc<LockVerifier>,
    /// Largest accepted upload in bytes.
    max_upload_size: u64,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        folder_repo: Arc<FolderRepository>,
        category_repo: Arc<CategoryRepository>,
        store: Arc<dyn ContentStore>,
        lock_verifier: Arc<LockVerifier>,
        max_upload_size: u64,
    ) -> Self {
        Self {
            file_repo,
            folder_repo,
            category_repo,
            store,
            lock_verifier,
            max_upload_size,
        }
    }

    /// Gets a file owned by the caller.
    pub async fn get_file(&self, ctx: &RequestContext, file_id: i64) -> Result<File, AppError> {
        require_owned(
            self.file_repo.find_by_id(file_id).await?,
            ctx.user_id,
            "File",
            file_id,
        )
    }

    /// Checks that an optional destination folder exists and is owned.
    async fn check_destination(&self, ctx: &RequestContext, folder_id: Option<i64>) -> Result<(), AppError> {
        if let Some(folder_id) = folder_id {
            require_owned(
                self.folder_repo.find_by_id(folder_id).await?,
                ctx.user_id,
                "Folder",
                folder_id,
            )?;
        }
        Ok(())
    }

    fn check_size(&self, size: u64) -> Result<(), AppError> {
        if size > self.max_upload_size {
            return Err(AppError::validation(format!(
                "File size {size} exceeds the maximum of {} bytes",
                self.max_upload_size
            )));
        }
        Ok(())
    }

    /// Stores an uploaded file and records it in `folder_id` (None = top level).
    ///
    /// Content written here is removed again if the record cannot be
    /// inserted.
    pub async fn record_upload(
        &self,
        ctx: &RequestContext,
        upload: UploadRequest,
        folder_id: Option<i64>,
        locked: bool,
    ) -> Result<File, AppError> {
        let name = normalize_name("File", &upload.name)?;
        self.check_destination(ctx, folder_id).await?;

        let mime_type = upload
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| mime::guess_from_name(&name).to_string());

        let (location, size, written_here) = match upload.content {
            UploadContent::Bytes(data) => {
                self.check_size(data.len() as u64)?;
                let size = data.len() as u64;
                (self.store.write(data).await?, size, true)
            }
            UploadContent::Stream(stream) => {
                let exceeded = Arc::new(AtomicBool::new(false));
                let capped = cap_stream(stream, self.max_upload_size, exceeded.clone());
                match self.store.write_stream(capped).await {
                    Ok((location, size)) => (location, size, true),
                    Err(_) if exceeded.load(Ordering::Relaxed) => {
                        return Err(AppError::validation(format!(
                            "File exceeds the maximum of {} bytes",
                            self.max_upload_size
                        )));
                    }
                    Err(e) => return Err(e),
                }
            }
            UploadContent::Stored { location, size } => {
                self.check_size(size)?;
                (location, size, false)
            }
        };

        let record = CreateFile {
            name,
            location: location.clone(),
            size: size as i64,
            mime_type,
            is_locked: locked,
            folder_id,
            user_id: ctx.user_id,
            category_id: None,
        };

        let file = match self.file_repo.create(&record).await {
            Ok(file) => file,
            Err(e) => {
                if written_here {
                    self.discard(&location).await;
                }
                return Err(e);
            }
        };

        info!(
            user_id = ctx.user_id,
            file_id = file.id,
            folder_id = ?file.folder_id,
            size = file.size,
            "File uploaded"
        );
        Ok(file)
    }

    async fn discard(&self, location: &str) {
        if let Err(e) = self.store.delete(location).await {
            warn!(location, error = %e, "Failed to remove orphaned content");
        }
    }

    /// Renames a file.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        new_name: &str,
    ) -> Result<File, AppError> {
        self.get_file(ctx, file_id).await?;
        let name = normalize_name("File", new_name)?;

        let file = self.file_repo.rename(file_id, &name).await?;
        info!(user_id = ctx.user_id, file_id, "File renamed");
        Ok(file)
    }

    /// Moves a file into another owned folder, or to the top level.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        folder_id: Option<i64>,
    ) -> Result<File, AppError> {
        self.get_file(ctx, file_id).await?;
        self.check_destination(ctx, folder_id).await?;

        let file = self.file_repo.move_file(file_id, folder_id).await?;
        info!(user_id = ctx.user_id, file_id, folder_id = ?folder_id, "File moved");
        Ok(file)
    }

    /// Deletes a file record and then its stored content.
    ///
    /// A failure to delete the content is logged and does not fail the
    /// operation.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: i64) -> Result<(), AppError> {
        let file = self.get_file(ctx, file_id).await?;

        self.file_repo.delete(file_id).await?;
        if let Err(e) = self.store.delete(&file.location).await {
            warn!(
                file_id,
                location = %file.location,
                error = %e,
                "Failed to delete stored content"
            );
        }

        info!(user_id = ctx.user_id, file_id, "File deleted");
        Ok(())
    }

    /// Locks a file. Locking a locked file changes nothing.
    pub async fn lock_file(&self, ctx: &RequestContext, file_id: i64) -> Result<File, AppError> {
        let file = self.get_file(ctx, file_id).await?;
        if file.is_locked {
            return Ok(file);
        }

        let file = self.file_repo.set_locked(file_id, true).await?;
        info!(user_id = ctx.user_id, file_id, "File locked");
        Ok(file)
    }

    /// Unlocks a file after the lock-password check.
    pub async fn unlock_file(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        password: Option<&str>,
        skip_check: bool,
    ) -> Result<File, AppError> {
        let file = self.get_file(ctx, file_id).await?;
        if !file.is_locked {
            return Err(AppError::not_applicable(format!("File {file_id} is not locked")));
        }

        self.lock_verifier.verify(ctx, password, skip_check).await?;

        let file = self.file_repo.set_locked(file_id, false).await?;
        info!(user_id = ctx.user_id, file_id, "File unlocked");
        Ok(file)
    }

    /// Assigns a global or own category to a file; `None` clears it.
    pub async fn assign_category(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        category_id: Option<i64>,
    ) -> Result<File, AppError> {
        self.get_file(ctx, file_id).await?;

        if let Some(category_id) = category_id {
            require_readable(
                self.category_repo.find_by_id(category_id).await?,
                ctx.user_id,
                "Category",
                category_id,
            )?;
        }

        let file = self.file_repo.set_category(file_id, category_id).await?;
        info!(
            user_id = ctx.user_id,
            file_id,
            category_id = ?category_id,
            "File category assigned"
        );
        Ok(file)
    }

    /// Caches a generated summary on the file record.
    pub async fn store_summary(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        summary: &str,
    ) -> Result<File, AppError> {
        self.get_file(ctx, file_id).await?;
        let file = self.file_repo.set_summary(file_id, summary).await?;
        info!(user_id = ctx.user_id, file_id, "File summary cached");
        Ok(file)
    }

    /// Lists the caller's unlocked files in a folder (None = top level),
    /// newest first.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        folder_id: Option<i64>,
    ) -> Result<Vec<File>, AppError> {
        self.check_destination(ctx, folder_id).await?;
        self.file_repo
            .find_unlocked_in_folder(ctx.user_id, folder_id)
            .await
    }

    /// Lists all of the caller's locked files, newest first.
    pub async fn list_locked(&self, ctx: &RequestContext) -> Result<Vec<File>, AppError> {
        self.file_repo.find_locked(ctx.user_id).await
    }

    /// Lists the caller's files in the named category (case-insensitive),
    /// or the uncategorized ones when `name` is `None`.
    pub async fn list_by_category(
        &self,
        ctx: &RequestContext,
        name: Option<&str>,
    ) -> Result<Vec<File>, AppError> {
        match name.map(str::trim) {
            Some(name) if !name.is_empty() => {
                self.file_repo.find_by_category_name(ctx.user_id, name).await
            }
            _ => self.file_repo.find_uncategorized(ctx.user_id).await,
        }
    }

    /// Opens a file's content. Locked files need the lock password.
    pub async fn read_content(
        &self,
        ctx: &RequestContext,
        file_id: i64,
        password: Option<&str>,
    ) -> Result<(File, ByteStream), AppError> {
        let file = self.get_file(ctx, file_id).await?;
        if file.is_locked {
            self.lock_verifier.verify(ctx, password, false).await?;
        }

        let stream = self.store.read(&file.location).await?;
        Ok((file, stream))
    }
}
