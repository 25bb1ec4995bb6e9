//! CLI command definitions and dispatch.

pub mod category;
pub mod export;
pub mod file;
pub mod folder;
pub mod migrate;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use filevault_core::config::AppConfig;
use filevault_core::error::AppError;
use filevault_database::DatabasePool;
use filevault_service::{RequestContext, Services};
use filevault_storage::{LocalContentStore, ZipArchiveFactory};

use crate::output::OutputFormat;

/// FileVault: personal folders, files, locks and archive export
#[derive(Debug, Parser)]
#[command(name = "filevault", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Account management
    User(user::UserArgs),
    /// Category management
    Category(category::CategoryArgs),
    /// Folder management
    Folder(folder::FolderArgs),
    /// File management
    File(file::FileArgs),
    /// Export folders as a zip archive
    Export(export::ExportArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, self.format).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
            Commands::Category(args) => category::execute(args, &config, self.format).await,
            Commands::Folder(args) => folder::execute(args, &config, self.format).await,
            Commands::File(args) => file::execute(args, &config, self.format).await,
            Commands::Export(args) => export::execute(args, &config).await,
        }
    }
}

/// Helper: open the database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<SqlitePool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}

/// Helper: open the database, apply pending migrations and wire the
/// services over the local content store
pub async fn create_services(config: &AppConfig) -> Result<Services, AppError> {
    let pool = create_db_pool(config).await?;
    filevault_database::migration::run_migrations(&pool).await?;

    let store = LocalContentStore::new(&config.storage.root_path).await?;
    Ok(Services::new(
        pool,
        Arc::new(store),
        Arc::new(ZipArchiveFactory),
        config,
    ))
}

/// Helper: act as the given user
pub fn as_user(user_id: i64) -> RequestContext {
    RequestContext::new(user_id)
}

/// Helper: ask before a destructive action unless `force` is set
pub fn confirm(prompt: &str, force: bool) -> Result<bool, AppError> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Helper: format an optional id for table output
pub fn display_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}
