//! Content store implementations.

pub mod local;
pub mod memory;

pub use local::LocalContentStore;
pub use memory::MemoryContentStore;

/// Generate a fresh location, sharded by the first two characters.
pub(crate) fn new_location() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}/{}", &id[..2], id)
}
