//! # filevault-entity
//!
//! Domain entity models for FileVault. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod category;
pub mod file;
pub mod folder;
pub mod item;
pub mod user;

pub use category::{Category, CreateCategory};
pub use file::{CreateFile, File};
pub use folder::{CreateFolder, Folder, FolderColor, FolderContents, FolderNode};
pub use item::ItemKind;
pub use user::{CreateUser, User};
