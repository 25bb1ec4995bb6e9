//! Wiring of the full service set.

use std::sync::Arc;

use sqlx::SqlitePool;

use filevault_auth::password::{PasswordHasher, PasswordValidator};
use filevault_core::config::AppConfig;
use filevault_core::traits::archive::ArchiveWriterFactory;
use filevault_core::traits::storage::ContentStore;
use filevault_database::repositories::{
    CategoryRepository, FileRepository, FolderRepository, UserRepository,
};

use crate::archive::ArchiveService;
use crate::category::CategoryService;
use crate::duplication::DuplicationService;
use crate::file::FileService;
use crate::folder::{FolderService, TreeService};
use crate::user::{LockVerifier, UserService};

/// Every service, built over one pool and one content store.
#[derive(Debug, Clone)]
pub struct Services {
    /// Account operations.
    pub users: Arc<UserService>,
    /// Folder hierarchy.
    pub folders: Arc<FolderService>,
    /// File placement.
    pub files: Arc<FileService>,
    /// Categories.
    pub categories: Arc<CategoryService>,
    /// Recursive copies.
    pub duplication: Arc<DuplicationService>,
    /// Archive export.
    pub archive: Arc<ArchiveService>,
}

impl Services {
    /// Builds all services.
    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ContentStore>,
        writers: Arc<dyn ArchiveWriterFactory>,
        config: &AppConfig,
    ) -> Self {
        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let folder_repo = Arc::new(FolderRepository::new(pool.clone()));
        let file_repo = Arc::new(FileRepository::new(pool.clone()));
        let category_repo = Arc::new(CategoryRepository::new(pool.clone()));

        let hasher = Arc::new(PasswordHasher::new());
        let validator = Arc::new(PasswordValidator::default());
        let lock_verifier = Arc::new(LockVerifier::new(user_repo.clone(), hasher.clone()));
        let tree = Arc::new(TreeService::new(folder_repo.clone()));

        Self {
            users: Arc::new(UserService::new(user_repo, hasher, validator)),
            folders: Arc::new(FolderService::new(
                pool.clone(),
                folder_repo.clone(),
                file_repo.clone(),
                tree.clone(),
                store.clone(),
                lock_verifier.clone(),
            )),
            files: Arc::new(FileService::new(
                file_repo.clone(),
                folder_repo.clone(),
                category_repo.clone(),
                store.clone(),
                lock_verifier.clone(),
                config.storage.max_upload_size_bytes,
            )),
            categories: Arc::new(CategoryService::new(category_repo)),
            duplication: Arc::new(DuplicationService::new(
                pool,
                folder_repo.clone(),
                file_repo.clone(),
                tree,
                store.clone(),
                lock_verifier.clone(),
            )),
            archive: Arc::new(ArchiveService::new(
                folder_repo,
                file_repo,
                store,
                writers,
                lock_verifier,
                config.archive.max_folders,
            )),
        }
    }
}
