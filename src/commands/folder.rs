//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use filevault_core::config::AppConfig;
use filevault_core::error::{AppError, ErrorKind};
use filevault_entity::folder::{Folder, FolderNode};
use filevault_entity::ItemKind;

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Acting user ID
    #[arg(short, long, global = true)]
    pub user: Option<i64>,

    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List folders at the top level or under a parent
    List {
        /// Parent folder ID (omit for the top level)
        #[arg(short, long)]
        parent: Option<i64>,
    },
    /// Create a new folder
    Create {
        /// Folder name
        name: String,
        /// Parent folder ID (omit for the top level)
        #[arg(short, long)]
        parent: Option<i64>,
        /// Color tag
        #[arg(long)]
        color: Option<String>,
    },
    /// Show a folder's visible contents
    Show {
        /// Folder ID
        id: i64,
    },
    /// Show a folder's subtree
    Tree {
        /// Folder ID
        id: i64,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        id: i64,
        /// New name
        name: String,
    },
    /// Move a folder under another one
    Move {
        /// Folder ID
        id: i64,
        /// Destination folder ID (omit for the top level)
        #[arg(long)]
        to: Option<i64>,
    },
    /// Copy a folder with its whole subtree
    Duplicate {
        /// Folder ID
        id: i64,
        /// Destination folder ID (omit to copy next to the source)
        #[arg(long)]
        to: Option<i64>,
    },
    /// Delete a folder with everything below it
    Delete {
        /// Folder ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Lock a folder
    Lock {
        /// Folder ID
        id: i64,
    },
    /// Unlock a folder with the lock password
    Unlock {
        /// Folder ID
        id: i64,
    },
    /// Toggle the important flag
    Important {
        /// Folder ID
        id: i64,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
pub(crate) struct FolderRow {
    id: i64,
    name: String,
    parent: String,
    color: String,
    locked: bool,
    important: bool,
    created_at: String,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            parent: super::display_id(f.parent_id),
            color: f.folder_color.clone(),
            locked: f.is_locked,
            important: f.is_important,
            created_at: f.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn print_tree(node: &FolderNode) {
    let indent = "  ".repeat(node.depth as usize);
    let lock = if node.is_locked { " [locked]" } else { "" };
    println!(
        "{indent}├── {}/ ({} files){lock}",
        node.name, node.file_count
    );
    for child in &node.children {
        print_tree(child);
    }
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let user = args
        .user
        .ok_or_else(|| AppError::validation("--user is required for folder commands"))?;
    let ctx = super::as_user(user);
    let services = super::create_services(config).await?;
    let folders = &services.folders;

    match &args.command {
        FolderCommand::List { parent } => {
            let rows: Vec<FolderRow> = folders
                .list_folders(&ctx, *parent)
                .await?
                .iter()
                .map(FolderRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        FolderCommand::Create {
            name,
            parent,
            color,
        } => {
            let folder = folders
                .create_folder(&ctx, name, *parent, color.as_deref())
                .await?;
            output::print_success(&format!("Folder '{}' created (id: {})", folder.name, folder.id));
        }
        FolderCommand::Show { id } => {
            let folder = folders.get_folder(&ctx, *id).await?;
            let password = if folder.is_locked {
                Some(super::file::prompt_lock_password()?)
            } else {
                None
            };
            let contents = folders
                .get_folder_with_contents(&ctx, *id, password.as_deref())
                .await?;

            let chain: Vec<String> = folders
                .get_parent_chain(&ctx, *id)
                .await?
                .into_iter()
                .map(|f| f.name)
                .chain(std::iter::once(contents.folder.name.clone()))
                .collect();
            println!("/{}", chain.join("/"));

            let rows: Vec<FolderRow> = contents.subfolders.iter().map(FolderRow::from).collect();
            output::print_list(&rows, format);
            let rows: Vec<super::file::FileRow> =
                contents.files.iter().map(super::file::FileRow::from).collect();
            output::print_list(&rows, format);
        }
        FolderCommand::Tree { id } => {
            let tree = folders.get_tree(&ctx, *id).await?;
            match format {
                OutputFormat::Table => {
                    print_tree(&tree);
                    println!(
                        "{} folders, {} files",
                        tree.total_folders(),
                        tree.total_files()
                    );
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&tree)
                        .map_err(|e| AppError::internal(format!("Failed to render tree: {e}")))?;
                    println!("{json}");
                }
            }
        }
        FolderCommand::Rename { id, name } => {
            let folder = folders.rename_folder(&ctx, *id, name).await?;
            output::print_success(&format!("Folder {} renamed to '{}'", folder.id, folder.name));
        }
        FolderCommand::Move { id, to } => {
            folders.move_folder(&ctx, *id, *to).await?;
            output::print_success(&format!(
                "Folder {id} moved to {}",
                super::display_id(*to)
            ));
        }
        FolderCommand::Duplicate { id, to } => {
            let duplication = &services.duplication;
            let result = match duplication
                .duplicate(&ctx, *id, ItemKind::Folder, *to, None, false)
                .await
            {
                Err(e) if e.kind == ErrorKind::Authentication => {
                    let password = super::file::prompt_lock_password()?;
                    duplication
                        .duplicate(&ctx, *id, ItemKind::Folder, *to, Some(&password), false)
                        .await?
                }
                other => other?,
            };
            output::print_success(&format!(
                "Copied {} folders and {} files",
                result.folders_copied, result.files_copied
            ));
        }
        FolderCommand::Delete { id, force } => {
            let folder = folders.get_folder(&ctx, *id).await?;
            let prompt = format!("Delete folder '{}' and everything in it?", folder.name);
            if !super::confirm(&prompt, *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            let summary = folders.delete_folder(&ctx, *id).await?;
            output::print_success(&format!(
                "Removed {} folders and {} files",
                summary.folders_removed, summary.files_removed
            ));
            if summary.content_failures > 0 {
                output::print_warning(&format!(
                    "{} stored contents could not be removed",
                    summary.content_failures
                ));
            }
        }
        FolderCommand::Lock { id } => {
            folders.lock_folder(&ctx, *id).await?;
            output::print_success(&format!("Folder {id} locked"));
        }
        FolderCommand::Unlock { id } => {
            let password = super::file::prompt_lock_password()?;
            folders
                .unlock_folder(&ctx, *id, Some(&password), false)
                .await?;
            output::print_success(&format!("Folder {id} unlocked"));
        }
        FolderCommand::Important { id } => {
            let important = folders.toggle_important(&ctx, *id).await?;
            let state = if important { "marked" } else { "unmarked" };
            output::print_success(&format!("Folder {id} {state} as important"));
        }
    }

    Ok(())
}
