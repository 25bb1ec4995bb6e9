//! Lock-password gate shared by the folder and file services.

use std::sync::Arc;

use tracing::debug;

use filevault_auth::password::PasswordHasher;
use filevault_core::error::AppError;
use filevault_core::result::OptionExt;
use filevault_database::repositories::UserRepository;

use crate::context::RequestContext;

/// Checks the caller's account-level lock password before locked content
/// is revealed or unlocked.
#[derive(Debug, Clone)]
pub struct LockVerifier {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
}

impl LockVerifier {
    /// Creates a new lock verifier.
    pub fn new(user_repo: Arc<UserRepository>, hasher: Arc<PasswordHasher>) -> Self {
        Self { user_repo, hasher }
    }

    /// Passes when `skip_check` is set, when the session already verified
    /// the lock password, or when `password` matches the stored hash.
    pub async fn verify(
        &self,
        ctx: &RequestContext,
        password: Option<&str>,
        skip_check: bool,
    ) -> Result<(), AppError> {
        if skip_check || ctx.unlock_verified {
            debug!(user_id = ctx.user_id, "Lock check satisfied by session");
            return Ok(());
        }

        let user = self
            .user_repo
            .find_by_id(ctx.user_id)
            .await?
            .or_not_found("User", ctx.user_id)?;

        self.hasher
            .verify_lock(password, user.lock_password_hash.as_deref())
    }
}
