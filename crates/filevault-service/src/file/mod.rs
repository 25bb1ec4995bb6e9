//! File placement services.

pub mod service;
pub mod upload;

pub use service::FileService;
pub use upload::{UploadContent, UploadRequest};
