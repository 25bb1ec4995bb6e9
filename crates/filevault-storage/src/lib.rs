//! # filevault-storage
//!
//! Content store implementations for FileVault (local filesystem and
//! in-memory) plus the zip archive writer used by folder exports.

pub mod archive;
pub mod mime;
pub mod providers;

pub use archive::{ZipArchiveFactory, ZipArchiveWriter};
pub use providers::{LocalContentStore, MemoryContentStore};
