//! # filevault-database
//!
//! SQLite connection management, schema migrations and the concrete
//! repositories for every FileVault entity.
//!
//! Repositories own a clone of the pool for one-shot statements. Methods
//! that must take part in a caller-managed transaction have an `_in`
//! variant that runs on a borrowed connection instead.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{CategoryRepository, FileRepository, FolderRepository, UserRepository};

