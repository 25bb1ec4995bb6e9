//! Password policy enforcement for new passwords.

use filevault_core::error::AppError;

/// Minimum length accepted for account and lock passwords.
pub const DEFAULT_MIN_LENGTH: usize = 8;

/// Validates new passwords against the length policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length, in characters.
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a validator with a custom minimum length.
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Validates a password, returning the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.trim().is_empty() {
            return Err(AppError::validation("Password is required"));
        }

        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        Ok(())
    }
}

impl Default for PasswordValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_LENGTH)
    }
}
