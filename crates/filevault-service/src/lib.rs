//! # filevault-service
//!
//! Business logic service layer for FileVault. Each service orchestrates
//! repositories, the content store and the ownership guard to implement
//! one group of use cases.
//!
//! Services follow constructor injection: every dependency is provided at
//! construction time via `Arc` references. [`Services`] wires the whole
//! set from a pool and a content store.

pub mod archive;
pub mod category;
pub mod context;
pub mod duplication;
pub mod file;
pub mod folder;
pub mod registry;
pub mod user;
pub(crate) mod validation;

pub use archive::{ArchiveExport, ArchiveService};
pub use category::CategoryService;
pub use context::RequestContext;
pub use duplication::{DuplicatedItem, DuplicationResult, DuplicationService};
pub use file::{FileService, UploadContent, UploadRequest};
pub use folder::{DeleteSummary, FolderService, TreeService};
pub use registry::Services;
pub use user::{LockVerifier, UserService};
