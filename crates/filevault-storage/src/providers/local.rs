//! Local filesystem content store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use filevault_core::error::{AppError, ErrorKind};
use filevault_core::result::AppResult;
use filevault_core::traits::storage::{ByteStream, ContentStore, Location};

use super::new_location;

/// Content store keeping every blob as a file under a root directory.
///
/// Locations look like `ab/ab12...` (uuid, sharded by its first two
/// characters) so that no single directory grows unbounded.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    /// Root directory for all stored content.
    root: PathBuf,
}

impl LocalContentStore {
    /// Create a new local store rooted at the given path.
    pub async fn new(root_path: impl AsRef<Path>) -> AppResult<Self> {
        let root = root_path.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location to a path within the root.
    ///
    /// Anything that could escape the root is rejected.
    fn resolve(&self, location: &str) -> AppResult<PathBuf> {
        let relative = Path::new(location);
        let safe = !location.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::validation(format!(
                "Invalid storage location: '{location}'"
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    fn store_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir())
    }

    async fn write(&self, data: Bytes) -> AppResult<Location> {
        let location = new_location();
        let full_path = self.resolve(&location)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write content: {location}"),
                e,
            )
        })?;

        debug!(location = %location, bytes = data.len(), "Wrote content");
        Ok(location)
    }

    async fn write_stream(&self, mut stream: ByteStream) -> AppResult<(Location, u64)> {
        let location = new_location();
        let full_path = self.resolve(&location)?;
        self.ensure_parent(&full_path).await?;

        let mut file = fs::File::create(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create content file: {location}"),
                e,
            )
        })?;

        let written = async {
            let mut total_bytes = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::with_source(ErrorKind::Storage, "Stream read error", e))?;
                total_bytes += chunk.len() as u64;
                file.write_all(&chunk).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
                })?;
            }
            file.flush()
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))?;
            Ok::<_, AppError>(total_bytes)
        }
        .await;

        let total_bytes = match written {
            Ok(total_bytes) => total_bytes,
            Err(e) => {
                drop(file);
                if let Err(remove) = fs::remove_file(&full_path).await {
                    warn!(location = %location, error = %remove, "Failed to remove partial content");
                }
                return Err(e);
            }
        };

        debug!(location = %location, bytes = total_bytes, "Wrote content from stream");
        Ok((location, total_bytes))
    }

    async fn read(&self, location: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(location)?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Content not found: {location}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open content: {location}"),
                    e,
                )
            }
        })?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn read_bytes(&self, location: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(location)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Content not found: {location}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read content: {location}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, location: &str) -> AppResult<()> {
        let full_path = self.resolve(location)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(location, "Deleted content");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete content: {location}"),
                e,
            )),
        }
    }

    async fn exists(&self, location: &str) -> AppResult<bool> {
        let full_path = self.resolve(location)?;
        Ok(fs::try_exists(&full_path).await.unwrap_or(false))
    }

    async fn copy(&self, location: &str) -> AppResult<Location> {
        let from_path = self.resolve(location)?;
        let new = new_location();
        let to_path = self.resolve(&new)?;
        self.ensure_parent(&to_path).await?;

        fs::copy(&from_path, &to_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Content not found: {location}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to copy {location} -> {new}"),
                    e,
                )
            }
        })?;

        debug!(from = location, to = %new, "Copied content");
        Ok(new)
    }
}
