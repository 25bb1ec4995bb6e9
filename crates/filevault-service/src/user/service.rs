//! Account registration, lookup and lock-password management.

use std::sync::Arc;

use tracing::{info, warn};

use filevault_auth::password::{PasswordHasher, PasswordValidator};
use filevault_core::error::AppError;
use filevault_core::result::OptionExt;
use filevault_database::repositories::UserRepository;
use filevault_entity::user::{CreateUser, User};

use crate::context::RequestContext;
use crate::validation::normalize_name;

/// Handles account operations.
#[derive(Debug, Clone)]
pub struct UserService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password validator.
    validator: Arc<PasswordValidator>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        user_repo: Arc<UserRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            validator,
        }
    }

    /// Registers a new account. The email is stored lowercased.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let name = normalize_name("User", name)?;
        let email = normalize_email(email)?;
        self.validator.validate(password)?;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(format!(
                "An account with email '{email}' already exists"
            )));
        }

        let password_hash = self.hasher.hash_password(password)?;
        let user = self
            .user_repo
            .create(&CreateUser {
                name,
                email,
                password_hash,
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, user_id: i64) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .or_not_found("User", user_id)
    }

    /// Gets a user by email (case-insensitive).
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        self.user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("User with email '{email}' not found")))
    }

    /// Lists every account.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.find_all().await
    }

    /// Checks credentials and records the login.
    ///
    /// Unknown email, wrong password and deactivated accounts all fail with
    /// the same `Authentication` error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let invalid = || AppError::authentication("Invalid email or password");

        let Some(user) = self.user_repo.find_by_email(email.trim()).await? else {
            return Err(invalid());
        };
        if !user.is_active {
            warn!(user_id = user.id, "Login attempt on deactivated account");
            return Err(invalid());
        }
        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        self.record_login(user.id).await?;
        self.get_user(user.id).await
    }

    /// Sets (or replaces) the caller's lock password.
    ///
    /// The current account password must be supplied.
    pub async fn set_lock_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_lock_password: &str,
    ) -> Result<(), AppError> {
        let user = self.get_user(ctx.user_id).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::authentication("Current password is incorrect"));
        }

        self.validator.validate(new_lock_password)?;
        let hash = self.hasher.hash_password(new_lock_password)?;
        self.user_repo
            .update_lock_password(user.id, Some(&hash))
            .await?;

        info!(user_id = user.id, "Lock password set");
        Ok(())
    }

    /// Verifies a lock-password attempt for a user.
    pub fn verify_lock_password(&self, user: &User, candidate: Option<&str>) -> Result<(), AppError> {
        self.hasher
            .verify_lock(candidate, user.lock_password_hash.as_deref())
    }

    /// Deactivates an account.
    pub async fn deactivate(&self, user_id: i64) -> Result<User, AppError> {
        let user = self.user_repo.set_active(user_id, false).await?;
        info!(user_id, "User deactivated");
        Ok(user)
    }

    /// Records a successful login.
    pub async fn record_login(&self, user_id: i64) -> Result<(), AppError> {
        self.user_repo.update_last_login(user_id).await
    }
}

/// Trim and lowercase an email address and check its basic shape.
fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'));
    if !valid {
        return Err(AppError::validation(format!("Invalid email address: '{raw}'")));
    }
    Ok(email)
}
