//! Upload request types handed to [`FileService::record_upload`](super::FileService::record_upload).

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures::StreamExt;

use filevault_core::traits::storage::ByteStream;

/// Where the bytes of an upload come from.
pub enum UploadContent {
    /// Fully buffered bytes, written to the content store by the service.
    Bytes(Bytes),
    /// A byte stream, written to the content store by the service.
    Stream(ByteStream),
    /// Content the caller already put in the store.
    Stored {
        /// Content store location.
        location: String,
        /// Size in bytes.
        size: u64,
    },
}

impl fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Stored { location, size } => f
                .debug_struct("Stored")
                .field("location", location)
                .field("size", size)
                .finish(),
        }
    }
}

/// Metadata and content of a file being recorded.
#[derive(Debug)]
pub struct UploadRequest {
    /// Original file name.
    pub name: String,
    /// MIME type; guessed from the name when absent.
    pub mime_type: Option<String>,
    /// The file content.
    pub content: UploadContent,
}

impl UploadRequest {
    /// Upload of in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            content: UploadContent::Bytes(data.into()),
        }
    }

    /// Sets an explicit MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Wraps an upload stream so that the first chunk taking it past `limit`
/// bytes turns into an error and sets `exceeded`. Content stores stop
/// reading on the first error, so nothing past that chunk is consumed.
pub(crate) fn cap_stream(stream: ByteStream, limit: u64, exceeded: Arc<AtomicBool>) -> ByteStream {
    let mut seen = 0u64;
    Box::pin(stream.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len() as u64;
        if seen > limit {
            exceeded.store(true, Ordering::Relaxed);
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("upload exceeds {limit} bytes"),
            ));
        }
        Ok(chunk)
    }))
}
