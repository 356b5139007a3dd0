//! Error types for param file conversion.
//!
//! Per-file failures (a source or destination that cannot be opened, an I/O
//! failure mid-stream) are reported and skipped by the batch driver, while
//! manifest and configuration failures abort the run.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for conversion operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The `.param` source is missing or unreadable
    #[error("Cannot open {}: {source}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The JSON destination cannot be created
    #[error("Cannot open {}: {source}", path.display())]
    DestinationOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the source failed after it was opened
    #[error("Failed to read input: {0}")]
    Read(#[source] io::Error),

    /// Writing the destination failed after it was created
    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),

    /// The manifest listing the files to convert cannot be read
    #[error("Cannot read manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration sources could not be merged or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A configuration value was read but makes no sense
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// A type alias for Results that use ConvertError.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub fn source_open(path: impl AsRef<Path>, source: io::Error) -> Self {
        ConvertError::SourceOpen {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn destination_open(path: impl AsRef<Path>, source: io::Error) -> Self {
        ConvertError::DestinationOpen {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new InvalidSetting error naming the offending key.
    pub fn invalid_setting<S1, S2>(key: S1, reason: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ConvertError::InvalidSetting(format!("{}: {}", key.into(), reason.into()))
    }

    /// Returns true if the batch should skip the file and keep going.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ConvertError::SourceOpen { .. }
                | ConvertError::DestinationOpen { .. }
                | ConvertError::Read(_)
                | ConvertError::Write(_)
        )
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConvertError::SourceOpen { path, .. }
            | ConvertError::DestinationOpen { path, .. }
            | ConvertError::Manifest { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the error category as a string for logging.
    pub fn category(&self) -> &'static str {
        match self {
            ConvertError::SourceOpen { .. } => "source_open",
            ConvertError::DestinationOpen { .. } => "destination_open",
            ConvertError::Read(_) => "read",
            ConvertError::Write(_) => "write",
            ConvertError::Manifest { .. } => "manifest",
            ConvertError::Config(_) => "config",
            ConvertError::InvalidSetting(_) => "invalid_setting",
        }
    }
}
