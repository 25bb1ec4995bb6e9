//! # filevault-auth
//!
//! Authorization primitives for FileVault.
//!
//! ## Modules
//!
//! - `ownership` — the owner-only access guard applied before every mutation
//! - `password` — Argon2id hashing for account and lock passwords, plus the length policy

pub mod ownership;
pub mod password;

pub use ownership::{Access, Owned, authorize, authorize_read, require_owned, require_readable};
pub use password::{PasswordHasher, PasswordValidator};
