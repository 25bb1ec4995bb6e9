//! Archive export configuration.

use serde::{Deserialize, Serialize};

/// Limits applied to folder archive exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Maximum number of folders accepted by a single export request.
    #[serde(default = "default_max_folders")]
    pub max_folders: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_folders: default_max_folders(),
        }
    }
}

fn default_max_folders() -> usize {
    50
}
