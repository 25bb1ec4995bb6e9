//! Repository implementations for all FileVault entities.

pub mod category;
pub mod file;
pub mod folder;
pub mod user;

pub use category::CategoryRepository;
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use user::UserRepository;

use filevault_core::error::{AppError, ErrorKind};

/// Map a sqlx failure into a database `AppError`, turning unique
/// constraint violations into `Conflict`.
pub(crate) fn map_db_error(context: &str, err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return AppError::conflict(format!("{context}: record already exists"));
        }
    }
    AppError::with_source(ErrorKind::Database, context.to_string(), err)
}
