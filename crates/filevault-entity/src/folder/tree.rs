//! Folder views assembled from several rows.

use serde::{Deserialize, Serialize};

use super::model::Folder;
use crate::file::File;

/// A folder together with its visible immediate children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderContents {
    /// The folder itself.
    pub folder: Folder,
    /// Unlocked immediate subfolders, newest first.
    pub subfolders: Vec<Folder>,
    /// Unlocked files directly inside the folder, newest first.
    pub files: Vec<File>,
}

/// A node in a folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    /// Folder ID.
    pub id: i64,
    /// Folder name.
    pub name: String,
    /// Whether the folder is locked.
    pub is_locked: bool,
    /// Depth below the requested node (0 for the node itself).
    pub depth: u32,
    /// Number of files directly inside this folder.
    pub file_count: u64,
    /// Child folder nodes.
    pub children: Vec<FolderNode>,
}

impl FolderNode {
    /// Total number of folders in this subtree, including this node.
    pub fn total_folders(&self) -> u64 {
        1 + self.children.iter().map(FolderNode::total_folders).sum::<u64>()
    }

    /// Total number of files in this subtree.
    pub fn total_files(&self) -> u64 {
        self.file_count + self.children.iter().map(FolderNode::total_files).sum::<u64>()
    }

    /// Height of the subtree (a leaf has height 1).
    pub fn height(&self) -> u32 {
        1 + self.children.iter().map(FolderNode::height).max().unwrap_or(0)
    }
}
