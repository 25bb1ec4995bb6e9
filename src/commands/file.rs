//! File management CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use tabled::Tabled;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::output::{self, OutputFormat};
use filevault_core::config::AppConfig;
use filevault_core::error::{AppError, ErrorKind};
use filevault_entity::{File, ItemKind};
use filevault_service::{UploadContent, UploadRequest};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// Acting user ID
    #[arg(short, long, global = true)]
    pub user: Option<i64>,

    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Upload a file from disk
    Upload {
        /// Path of the file to upload
        path: PathBuf,
        /// Destination folder ID (omit for the top level)
        #[arg(long)]
        folder: Option<i64>,
        /// Name to store the file under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Explicit MIME type
        #[arg(long)]
        mime_type: Option<String>,
        /// Store the file locked
        #[arg(long)]
        locked: bool,
    },
    /// List unlocked files at the top level or in a folder
    List {
        /// Folder ID (omit for the top level)
        #[arg(long)]
        folder: Option<i64>,
    },
    /// List locked files
    Locked,
    /// List files in a category, or uncategorized files
    ByCategory {
        /// Category name (omit for uncategorized files)
        name: Option<String>,
    },
    /// Write a file's content to disk
    Download {
        /// File ID
        id: i64,
        /// Output path (defaults to the stored name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rename a file
    Rename {
        /// File ID
        id: i64,
        /// New name
        name: String,
    },
    /// Move a file into a folder
    Move {
        /// File ID
        id: i64,
        /// Destination folder ID (omit for the top level)
        #[arg(long)]
        to: Option<i64>,
    },
    /// Copy a file
    Duplicate {
        /// File ID
        id: i64,
        /// Destination folder ID (omit to copy next to the source)
        #[arg(long)]
        to: Option<i64>,
    },
    /// Assign or clear a file's category
    Categorize {
        /// File ID
        id: i64,
        /// Category ID (omit to clear)
        #[arg(long)]
        category: Option<i64>,
    },
    /// Delete a file
    Delete {
        /// File ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Lock a file
    Lock {
        /// File ID
        id: i64,
    },
    /// Unlock a file with the lock password
    Unlock {
        /// File ID
        id: i64,
    },
}

/// File display row
#[derive(Debug, Serialize, Tabled)]
pub(crate) struct FileRow {
    id: i64,
    name: String,
    folder: String,
    size: i64,
    mime_type: String,
    locked: bool,
    category: String,
    created_at: String,
}

impl From<&File> for FileRow {
    fn from(f: &File) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            folder: super::display_id(f.folder_id),
            size: f.size,
            mime_type: f.mime_type.clone(),
            locked: f.is_locked,
            category: super::display_id(f.category_id),
            created_at: f.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Prompt for the lock password
pub(crate) fn prompt_lock_password() -> Result<String, AppError> {
    dialoguer::Password::new()
        .with_prompt("Lock password")
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

fn io_error(context: String, e: std::io::Error) -> AppError {
    AppError::with_source(ErrorKind::Storage, context, e)
}

async fn upload_request(
    path: &Path,
    name: Option<&str>,
    mime_type: Option<&str>,
) -> Result<UploadRequest, AppError> {
    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::validation(format!("No file name in {}", path.display())))?,
    };
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| io_error(format!("Failed to open {}", path.display()), e))?;

    Ok(UploadRequest {
        name,
        mime_type: mime_type.map(str::to_string),
        content: UploadContent::Stream(Box::pin(ReaderStream::new(file))),
    })
}

/// Execute file commands
pub async fn execute(
    args: &FileArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let user = args
        .user
        .ok_or_else(|| AppError::validation("--user is required for file commands"))?;
    let ctx = super::as_user(user);
    let services = super::create_services(config).await?;
    let files = &services.files;

    match &args.command {
        FileCommand::Upload {
            path,
            folder,
            name,
            mime_type,
            locked,
        } => {
            let request = upload_request(path, name.as_deref(), mime_type.as_deref()).await?;
            let file = files.record_upload(&ctx, request, *folder, *locked).await?;
            output::print_success(&format!(
                "Uploaded '{}' ({} bytes, id: {})",
                file.name, file.size, file.id
            ));
        }
        FileCommand::List { folder } => {
            let rows: Vec<FileRow> = files
                .list_files(&ctx, *folder)
                .await?
                .iter()
                .map(FileRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        FileCommand::Locked => {
            let rows: Vec<FileRow> = files
                .list_locked(&ctx)
                .await?
                .iter()
                .map(FileRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        FileCommand::ByCategory { name } => {
            let rows: Vec<FileRow> = files
                .list_by_category(&ctx, name.as_deref())
                .await?
                .iter()
                .map(FileRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        FileCommand::Download { id, output: target } => {
            let file = files.get_file(&ctx, *id).await?;
            let password = if file.is_locked {
                Some(prompt_lock_password()?)
            } else {
                None
            };
            let (file, mut stream) = files.read_content(&ctx, *id, password.as_deref()).await?;

            let target = target.clone().unwrap_or_else(|| PathBuf::from(&file.name));
            let mut out = tokio::fs::File::create(&target)
                .await
                .map_err(|e| io_error(format!("Failed to create {}", target.display()), e))?;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| io_error("Failed to read content".to_string(), e))?;
                out.write_all(&chunk)
                    .await
                    .map_err(|e| io_error(format!("Failed to write {}", target.display()), e))?;
            }
            out.flush()
                .await
                .map_err(|e| io_error(format!("Failed to write {}", target.display()), e))?;
            output::print_success(&format!("Saved '{}' to {}", file.name, target.display()));
        }
        FileCommand::Rename { id, name } => {
            let file = files.rename_file(&ctx, *id, name).await?;
            output::print_success(&format!("File {} renamed to '{}'", file.id, file.name));
        }
        FileCommand::Move { id, to } => {
            files.move_file(&ctx, *id, *to).await?;
            output::print_success(&format!("File {id} moved to {}", super::display_id(*to)));
        }
        FileCommand::Duplicate { id, to } => {
            let duplication = &services.duplication;
            match duplication
                .duplicate(&ctx, *id, ItemKind::File, *to, None, false)
                .await
            {
                Err(e) if e.kind == ErrorKind::Authentication => {
                    let password = prompt_lock_password()?;
                    duplication
                        .duplicate(&ctx, *id, ItemKind::File, *to, Some(&password), false)
                        .await?;
                }
                other => {
                    other?;
                }
            }
            output::print_success(&format!("File {id} copied"));
        }
        FileCommand::Categorize { id, category } => {
            files.assign_category(&ctx, *id, *category).await?;
            output::print_success(&format!(
                "File {id} category set to {}",
                super::display_id(*category)
            ));
        }
        FileCommand::Delete { id, force } => {
            let file = files.get_file(&ctx, *id).await?;
            if !super::confirm(&format!("Delete file '{}'?", file.name), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            files.delete_file(&ctx, *id).await?;
            output::print_success(&format!("File '{}' deleted", file.name));
        }
        FileCommand::Lock { id } => {
            files.lock_file(&ctx, *id).await?;
            output::print_success(&format!("File {id} locked"));
        }
        FileCommand::Unlock { id } => {
            let password = prompt_lock_password()?;
            files.unlock_file(&ctx, *id, Some(&password), false).await?;
            output::print_success(&format!("File {id} unlocked"));
        }
    }

    Ok(())
}
