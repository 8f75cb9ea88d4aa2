//! Save Files
//!
//! Writes the sample histories of every probe to tab-separated text files,
//! one block per save, and picks the file names.

mod format;
mod naming;
mod writer;

pub use format::{format_epoch, format_float, write_header, write_rows};
pub use naming::{autosave_stem, default_stem, resolve_file_name};
pub use writer::{SaveKind, SaveWriter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported save file formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// Tab-separated text with a `#` header
    #[default]
    Txt,
}

impl SaveFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Txt => "txt",
        }
    }
}

/// Errors while saving
#[derive(Error, Debug)]
pub enum DatalogError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Save directory is not a directory: {0}")]
    NotADirectory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(SaveFormat::Txt.extension(), "txt");
        assert_eq!(serde_json::to_string(&SaveFormat::Txt).unwrap(), "\"txt\"");
    }
}
