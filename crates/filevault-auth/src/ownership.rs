//! Owner-only access guard.
//!
//! Every folder, file and category belongs to exactly one user (global
//! categories to nobody). Only the owner may act on an entity. Lookups
//! always check existence before ownership, so a caller can tell a
//! missing id apart from somebody else's.

use filevault_core::error::AppError;
use filevault_entity::{Category, File, Folder};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The principal may act on the entity.
    Allowed,
    /// The principal may not act on the entity.
    Denied,
}

impl Access {
    /// Whether access was granted.
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// An entity with an owning user.
pub trait Owned {
    /// The owning user, or `None` for shared entities.
    fn owner_id(&self) -> Option<i64>;
}

impl Owned for Folder {
    fn owner_id(&self) -> Option<i64> {
        Some(self.user_id)
    }
}

impl Owned for File {
    fn owner_id(&self) -> Option<i64> {
        Some(self.user_id)
    }
}

impl Owned for Category {
    fn owner_id(&self) -> Option<i64> {
        self.user_id
    }
}

/// Write access: allowed only when the principal owns the entity.
pub fn authorize<T: Owned + ?Sized>(entity: &T, principal_id: i64) -> Access {
    if entity.owner_id() == Some(principal_id) {
        Access::Allowed
    } else {
        Access::Denied
    }
}

/// Read access: shared entities are readable by everyone.
pub fn authorize_read<T: Owned + ?Sized>(entity: &T, principal_id: i64) -> Access {
    match entity.owner_id() {
        None => Access::Allowed,
        Some(_) => authorize(entity, principal_id),
    }
}

/// Resolve a lookup result for writing: absent is `NotFound`, present but
/// not owned is `Forbidden`.
pub fn require_owned<T: Owned>(
    entity: Option<T>,
    principal_id: i64,
    label: &str,
    id: i64,
) -> Result<T, AppError> {
    let entity = entity.ok_or_else(|| AppError::not_found(format!("{label} {id} not found")))?;
    match authorize(&entity, principal_id) {
        Access::Allowed => Ok(entity),
        Access::Denied => Err(AppError::forbidden(format!(
            "{label} {id} does not belong to the current user"
        ))),
    }
}

/// Like [`require_owned`] but accepts shared entities.
pub fn require_readable<T: Owned>(
    entity: Option<T>,
    principal_id: i64,
    label: &str,
    id: i64,
) -> Result<T, AppError> {
    let entity = entity.ok_or_else(|| AppError::not_found(format!("{label} {id} not found")))?;
    match authorize_read(&entity, principal_id) {
        Access::Allowed => Ok(entity),
        Access::Denied => Err(AppError::forbidden(format!(
            "{label} {id} does not belong to the current user"
        ))),
    }
}
