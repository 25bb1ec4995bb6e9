//! Folder color tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The palette of color tags a folder may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderColor {
    /// The default tag.
    #[default]
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    Orange,
    Gray,
    Pink,
}

impl FolderColor {
    /// Return the color as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Gray => "gray",
            Self::Pink => "pink",
        }
    }
}

impl fmt::Display for FolderColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FolderColor {
    type Err = filevault_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blue" => Ok(Self::Blue),
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "purple" => Ok(Self::Purple),
            "orange" => Ok(Self::Orange),
            "gray" | "grey" => Ok(Self::Gray),
            "pink" => Ok(Self::Pink),
            _ => Err(filevault_core::AppError::validation(format!(
                "Invalid folder color: '{s}'. Expected one of: blue, red, green, yellow, purple, orange, gray, pink"
            ))),
        }
    }
}
