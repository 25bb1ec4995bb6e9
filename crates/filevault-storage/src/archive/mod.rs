//! Archive writers used by folder exports.

pub mod zip_writer;

pub use zip_writer::{ZipArchiveFactory, ZipArchiveWriter};
