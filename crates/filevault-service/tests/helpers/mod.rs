//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use sqlx::SqlitePool;

use filevault_core::config::{AppConfig, DatabaseConfig};
use filevault_database::DatabasePool;
use filevault_entity::{File, Folder, User};
use filevault_service::{RequestContext, Services, UploadRequest};
use filevault_storage::{MemoryContentStore, ZipArchiveFactory};

/// Password every test account is registered with.
pub const PASSWORD: &str = "password123";

/// Lock password set by [`TestApp::create_user_with_lock`].
pub const LOCK_PASSWORD: &str = "lock-secret";

/// Test application: in-memory database, migrated, with services wired
/// around a memory content store.
pub struct TestApp {
    /// Database pool for direct queries.
    pub pool: SqlitePool,
    /// All services.
    pub services: Services,
    /// The content store behind the services.
    pub store: MemoryContentStore,
    /// Application config.
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application with default limits.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a new test application with the given config; the database
    /// section is always replaced by an in-memory one.
    pub async fn with_config(mut config: AppConfig) -> Self {
        config.database = DatabaseConfig::in_memory();

        let db = DatabasePool::connect(&config.database)
            .await
            .expect("Failed to open in-memory database");
        filevault_database::migration::run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let pool = db.into_pool();
        let store = MemoryContentStore::new();
        let services = Services::new(
            pool.clone(),
            Arc::new(store.clone()),
            Arc::new(ZipArchiveFactory),
            &config,
        );

        Self {
            pool,
            services,
            store,
            config,
        }
    }

    /// Register a user and return it with a request context.
    pub async fn create_user(&self, name: &str) -> (User, RequestContext) {
        let user = self
            .services
            .users
            .register(name, &format!("{name}@example.com"), PASSWORD)
            .await
            .expect("Failed to register user");
        let ctx = RequestContext::new(user.id);
        (user, ctx)
    }

    /// Register a user that has [`LOCK_PASSWORD`] configured.
    pub async fn create_user_with_lock(&self, name: &str) -> (User, RequestContext) {
        let (user, ctx) = self.create_user(name).await;
        self.services
            .users
            .set_lock_password(&ctx, PASSWORD, LOCK_PASSWORD)
            .await
            .expect("Failed to set lock password");
        (user, ctx)
    }

    /// Create a folder.
    pub async fn folder(&self, ctx: &RequestContext, name: &str, parent: Option<i64>) -> Folder {
        self.services
            .folders
            .create_folder(ctx, name, parent, None)
            .await
            .expect("Failed to create folder")
    }

    /// Upload a small text file.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        name: &str,
        content: &'static str,
        folder: Option<i64>,
    ) -> File {
        self.services
            .files
            .record_upload(
                ctx,
                UploadRequest::from_bytes(name, Bytes::from_static(content.as_bytes())),
                folder,
                false,
            )
            .await
            .expect("Failed to upload file")
    }

    /// Number of folder rows in the database.
    pub async fn folder_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM folders")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count folders")
    }

    /// Number of file rows in the database.
    pub async fn file_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count files")
    }
}
