//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::debug;

use filevault_core::error::AppError;

/// Hashes account and lock passwords with Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Creates a hasher with the default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes a plaintext password with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; a malformed hash is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    /// Checks a lock-password attempt.
    ///
    /// A missing attempt, a missing stored hash and a mismatch all fail
    /// with `Authentication`.
    pub fn verify_lock(&self, candidate: Option<&str>, stored: Option<&str>) -> Result<(), AppError> {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return Err(AppError::authentication("Lock password required"));
        };
        let Some(stored) = stored else {
            debug!("Unlock attempted without a configured lock password");
            return Err(AppError::authentication("No lock password has been set"));
        };

        if self.verify_password(candidate, stored)? {
            Ok(())
        } else {
            Err(AppError::authentication("Incorrect lock password"))
        }
    }
}
