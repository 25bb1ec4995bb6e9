//! # filevault-core
//!
//! Core crate for FileVault. Contains the collaborator traits (content
//! store, archive writer), configuration schemas, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other FileVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::{AppResult, OptionExt};
