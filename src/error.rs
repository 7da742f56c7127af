//! Unified error handling for the track-processor library.
//!
//! Only the collaborators at the edges (CSV reader, config loader, writers)
//! can fail. The trajectory stages themselves are total and never return
//! these errors.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for track-processor operations.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Opening, reading or writing a file failed
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed CSV structure (unbalanced quotes, bad UTF-8, ...)
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Header row lacks one or more of the configured column roles
    #[error("missing required columns ({id}, {latitude}, {longitude}, {timestamp})")]
    MissingColumns {
        id: String,
        latitude: String,
        longitude: String,
        timestamp: String,
    },

    /// A data row carried a value that could not be parsed
    #[error("invalid {field} at row {row}: '{value}' ({message})")]
    InvalidField {
        row: u64,
        field: &'static str,
        value: String,
        message: String,
    },

    /// Configuration file could not be read or created
    #[error("configuration error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Configuration document is not valid YAML for the expected shape
    #[error("unable to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for track-processor operations.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Extension trait attaching the offending path to I/O results.
pub trait IoResultExt<T> {
    /// Convert an `io::Result` into a [`TrackError::Io`] for `path`.
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| TrackError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
