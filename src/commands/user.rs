//! Account management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use filevault_core::config::AppConfig;
use filevault_core::error::AppError;
use filevault_entity::User;

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a new account
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// List all accounts
    List,
    /// Show one account by ID or email
    Show {
        /// User ID or email
        user: String,
    },
    /// Set or replace a user's lock password
    SetLockPassword {
        /// User ID
        #[arg(short, long)]
        user: i64,
    },
    /// Deactivate an account
    Deactivate {
        /// User ID
        user: i64,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    active: bool,
    lock_password: bool,
    created_at: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            active: u.is_active,
            lock_password: u.has_lock_password(),
            created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn prompt_password(prompt: &str, confirm: bool) -> Result<String, AppError> {
    let mut input = dialoguer::Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Repeat", "Entries do not match");
    }
    input
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::create_services(config).await?;
    let users = &services.users;

    match &args.command {
        UserCommand::Create {
            name,
            email,
            password,
        } => {
            let password = match password {
                Some(p) => p.clone(),
                None => prompt_password("Password", true)?,
            };
            let user = users.register(name, email, &password).await?;
            output::print_success(&format!("User '{}' created (id: {})", user.email, user.id));
        }
        UserCommand::List => {
            let rows: Vec<UserRow> = users.list_users().await?.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
        }
        UserCommand::Show { user } => {
            let user = match user.parse::<i64>() {
                Ok(id) => users.get_user(id).await?,
                Err(_) => users.get_user_by_email(user).await?,
            };
            output::print_item(&UserRow::from(&user), format);
        }
        UserCommand::SetLockPassword { user } => {
            let ctx = super::as_user(*user);
            let current = prompt_password("Current account password", false)?;
            let lock = prompt_password("New lock password", true)?;
            users.set_lock_password(&ctx, &current, &lock).await?;
            output::print_success("Lock password updated");
        }
        UserCommand::Deactivate { user, force } => {
            if !super::confirm(&format!("Deactivate user {user}?"), *force)? {
                println!("Cancelled.");
                return Ok(());
            }
            let user = users.deactivate(*user).await?;
            output::print_success(&format!("User '{}' deactivated", user.email));
        }
    }

    Ok(())
}
