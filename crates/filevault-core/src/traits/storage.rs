//! Content store trait for pluggable file-content backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// A byte stream type used for reading file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opaque reference to stored content, as persisted in `files.location`.
pub type Location = String;

/// Storage of raw file bytes addressed by opaque location references.
///
/// The core never dictates the storage medium: it writes bytes and gets a
/// location back, and later reads, copies or deletes by that location.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g. "local", "memory").
    fn store_type(&self) -> &str;

    /// Check whether the store is usable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Persist bytes and return the new location.
    async fn write(&self, data: Bytes) -> AppResult<Location>;

    /// Persist a byte stream and return the new location and byte count.
    async fn write_stream(&self, stream: ByteStream) -> AppResult<(Location, u64)>;

    /// Open stored content as a byte stream.
    ///
    /// Fails with `NotFound` when nothing is stored at `location`.
    async fn read(&self, location: &str) -> AppResult<ByteStream>;

    /// Delete stored content. Deleting an absent location succeeds.
    async fn delete(&self, location: &str) -> AppResult<()>;

    /// Check whether content exists at `location`.
    async fn exists(&self, location: &str) -> AppResult<bool>;

    /// Read stored content fully into memory.
    async fn read_bytes(&self, location: &str) -> AppResult<Bytes> {
        let mut stream = self.read(location).await?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("Failed to read {location}"), e)
            })?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Copy stored content to a fresh location.
    async fn copy(&self, location: &str) -> AppResult<Location> {
        let stream = self.read(location).await?;
        let (new_location, _) = self.write_stream(stream).await?;
        Ok(new_location)
    }
}
