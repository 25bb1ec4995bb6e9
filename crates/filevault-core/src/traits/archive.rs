//! Archive-building collaborator used by folder exports.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;
use crate::traits::storage::ByteStream;

/// A finished archive ready to be streamed to the caller.
pub struct ArchiveOutput {
    /// The archive bytes.
    pub stream: ByteStream,
    /// Total archive size in bytes.
    pub size_bytes: u64,
    /// MIME type of the archive format.
    pub mime_type: &'static str,
}

impl std::fmt::Debug for ArchiveOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveOutput")
            .field("size_bytes", &self.size_bytes)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Receives directory and file entries and produces a compressed archive.
///
/// Paths are `/`-separated and relative to the archive root. The exporter
/// never compresses anything itself; it only feeds entries in tree order.
/// Implementations must keep compression and blocking I/O off the async
/// worker threads.
#[async_trait]
pub trait ArchiveWriter: Send {
    /// Add an (empty) directory entry.
    async fn add_directory(&mut self, path: &str) -> AppResult<()>;

    /// Add a file entry with the given content.
    async fn add_file(&mut self, path: &str, data: Bytes) -> AppResult<()>;

    /// Finalize the archive.
    async fn finish(self: Box<Self>) -> AppResult<ArchiveOutput>;
}

/// Creates a fresh [`ArchiveWriter`] per export.
pub trait ArchiveWriterFactory: Send + Sync + std::fmt::Debug + 'static {
    /// Start a new archive.
    fn create(&self) -> AppResult<Box<dyn ArchiveWriter>>;
}
