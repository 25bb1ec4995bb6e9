//! In-memory content store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use tracing::debug;

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_core::traits::storage::{ByteStream, ContentStore, Location};

use super::new_location;

/// Content store keeping blobs in a concurrent map. Used by tests and
/// dry runs; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    blobs: Arc<DashMap<String, Bytes>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Drop a blob behind the database's back.
    pub fn forget(&self, location: &str) -> bool {
        self.blobs.remove(location).is_some()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn write(&self, data: Bytes) -> AppResult<Location> {
        let location = new_location();
        debug!(location = %location, bytes = data.len(), "Stored content in memory");
        self.blobs.insert(location.clone(), data);
        Ok(location)
    }

    async fn write_stream(&self, mut stream: ByteStream) -> AppResult<(Location, u64)> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
            buf.extend_from_slice(&chunk);
        }
        let size = buf.len() as u64;
        let location = self.write(buf.freeze()).await?;
        Ok((location, size))
    }

    async fn read(&self, location: &str) -> AppResult<ByteStream> {
        let data = self.read_bytes(location).await?;
        Ok(Box::pin(stream::once(async move { Ok(data) })))
    }

    async fn read_bytes(&self, location: &str) -> AppResult<Bytes> {
        self.blobs
            .get(location)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Content not found: {location}")))
    }

    async fn delete(&self, location: &str) -> AppResult<()> {
        self.blobs.remove(location);
        Ok(())
    }

    async fn exists(&self, location: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(location))
    }

    async fn copy(&self, location: &str) -> AppResult<Location> {
        let data = self.read_bytes(location).await?;
        self.write(data).await
    }
}
