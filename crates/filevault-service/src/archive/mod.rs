//! Folder export as a compressed archive.

pub mod naming;
pub mod service;

pub use service::{ArchiveExport, ArchiveService};
