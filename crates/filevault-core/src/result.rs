//! Result alias shared by every FileVault crate.

use crate::error::AppError;

/// `Result` specialised to [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Turn an `Option` lookup into a `NotFound` error naming the entity.
pub trait OptionExt<T> {
    /// Returns the contained value or `NotFound("<label> <id> not found")`.
    fn or_not_found(self, label: &str, id: i64) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, label: &str, id: i64) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(format!("{label} {id} not found")))
    }
}
