//! Zip archive writer spooled to a temporary file.

use std::fs::File as StdFile;
use std::io::{Seek, SeekFrom, Write};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_core::traits::archive::{ArchiveOutput, ArchiveWriter, ArchiveWriterFactory};

/// MIME type of the produced archives.
pub const ZIP_MIME_TYPE: &str = "application/zip";

/// Creates [`ZipArchiveWriter`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveFactory;

impl ArchiveWriterFactory for ZipArchiveFactory {
    fn create(&self) -> AppResult<Box<dyn ArchiveWriter>> {
        Ok(Box::new(ZipArchiveWriter::new()?))
    }
}

/// Writes a Deflate-compressed zip into an anonymous temporary file, so
/// the archive never has to fit in memory.
///
/// Compression and spool I/O run on the blocking pool; the zip writer is
/// handed to each blocking task and taken back when it completes.
pub struct ZipArchiveWriter {
    zip: Option<ZipWriter<StdFile>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ZipArchiveWriter {
    /// Start a new archive backed by a temporary file.
    pub fn new() -> AppResult<Self> {
        let spool = tempfile::tempfile().map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create archive spool file", e)
        })?;
        Ok(Self {
            zip: Some(ZipWriter::new(spool)),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        })
    }

    fn take_zip(&mut self) -> AppResult<ZipWriter<StdFile>> {
        self.zip
            .take()
            .ok_or_else(|| AppError::internal("Archive writer was lost by a failed task"))
    }

    /// Run `op` against the zip writer on the blocking pool.
    async fn on_blocking_pool<F>(&mut self, op: F) -> AppResult<()>
    where
        F: FnOnce(&mut ZipWriter<StdFile>) -> AppResult<()> + Send + 'static,
    {
        let mut zip = self.take_zip()?;
        let (zip, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut zip);
            (zip, result)
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Archive task panicked", e))?;
        self.zip = Some(zip);
        result
    }
}

fn zip_error(context: String, e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, context, e)
}

#[async_trait]
impl ArchiveWriter for ZipArchiveWriter {
    async fn add_directory(&mut self, path: &str) -> AppResult<()> {
        let options = self.options;
        let path = path.to_string();
        self.on_blocking_pool(move |zip| {
            zip.add_directory(path.as_str(), options)
                .map_err(|e| zip_error(format!("Failed to add directory '{path}'"), e))
        })
        .await?;
        self.entries += 1;
        Ok(())
    }

    async fn add_file(&mut self, path: &str, data: Bytes) -> AppResult<()> {
        let options = self.options;
        let path = path.to_string();
        self.on_blocking_pool(move |zip| {
            zip.start_file(path.as_str(), options)
                .map_err(|e| zip_error(format!("Failed to start entry '{path}'"), e))?;
            zip.write_all(&data).map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("Failed to write entry '{path}'"), e)
            })
        })
        .await?;
        self.entries += 1;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> AppResult<ArchiveOutput> {
        let mut this = *self;
        let entries = this.entries;
        let zip = this.take_zip()?;

        let (spool, size_bytes) = tokio::task::spawn_blocking(move || -> AppResult<(StdFile, u64)> {
            let mut spool = zip
                .finish()
                .map_err(|e| zip_error("Failed to finalize archive".to_string(), e))?;
            let size_bytes = spool
                .seek(SeekFrom::End(0))
                .and_then(|size| spool.seek(SeekFrom::Start(0)).map(|_| size))
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to rewind archive", e)
                })?;
            Ok((spool, size_bytes))
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Archive task panicked", e))??;

        debug!(entries, size_bytes, "Finalized zip archive");

        let file = tokio::fs::File::from_std(spool);
        Ok(ArchiveOutput {
            stream: Box::pin(ReaderStream::new(file)),
            size_bytes,
            mime_type: ZIP_MIME_TYPE,
        })
    }
}
