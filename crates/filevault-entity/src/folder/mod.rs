//! Folder domain entities.

pub mod color;
pub mod model;
pub mod tree;

pub use color::FolderColor;
pub use model::{CreateFolder, Folder};
pub use tree::{FolderContents, FolderNode};
