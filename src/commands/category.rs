//! Category management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use filevault_core::config::AppConfig;
use filevault_core::error::AppError;
use filevault_entity::Category;

/// Arguments for category commands
#[derive(Debug, Args)]
pub struct CategoryArgs {
    /// Category subcommand
    #[command(subcommand)]
    pub command: CategoryCommand,
}

/// Category subcommands
#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// Create a category shared by every user
    CreateGlobal {
        /// Category name
        name: String,
    },
    /// Create a private category
    Create {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,
        /// Category name
        name: String,
    },
    /// List global categories, or those visible to a user
    List {
        /// User ID
        #[arg(short, long)]
        user: Option<i64>,
    },
    /// Delete a private category
    Delete {
        /// Owning user ID
        #[arg(short, long)]
        user: i64,
        /// Category ID
        id: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Category display row
#[derive(Debug, Serialize, Tabled)]
struct CategoryRow {
    id: i64,
    name: String,
    owner: String,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            owner: c
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "global".to_string()),
        }
    }
}

/// Execute category commands
pub async fn execute(
    args: &CategoryArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::create_services(config).await?;
    let categories = &services.categories;

    match &args.command {
        CategoryCommand::CreateGlobal { name } => {
            let category = categories.create_global_category(name).await?;
            output::print_success(&format!(
                "Global category '{}' created (id: {})",
                category.name, category.id
            ));
        }
        CategoryCommand::Create { user, name } => {
            let category = categories
                .create_category(&super::as_user(*user), name)
                .await?;
            output::print_success(&format!(
                "Category '{}' created (id: {})",
                category.name, category.id
            ));
        }
        CategoryCommand::List { user } => {
            let listed = match user {
                Some(user) => categories.list_categories(&super::as_user(*user)).await?,
                None => categories.list_global_categories().await?,
            };
            let rows: Vec<CategoryRow> = listed.iter().map(CategoryRow::from).collect();
            output::print_list(&rows, format);
        }
        CategoryCommand::Delete { user, id, force } => {
            if !super::confirm(&format!("Delete category {id}?"), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            categories
                .delete_category(&super::as_user(*user), *id)
                .await?;
            output::print_success(&format!("Category {id} deleted"));
        }
    }

    Ok(())
}
