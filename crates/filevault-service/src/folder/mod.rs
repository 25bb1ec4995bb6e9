//! Folder hierarchy services.

pub mod service;
pub mod tree;

pub use service::{DeleteSummary, FolderService};
pub use tree::TreeService;
