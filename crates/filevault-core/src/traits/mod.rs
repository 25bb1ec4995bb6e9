//! Collaborator traits implemented outside the core.

pub mod archive;
pub mod storage;

pub use archive::{ArchiveOutput, ArchiveWriter, ArchiveWriterFactory};
pub use storage::{ByteStream, ContentStore, Location};
