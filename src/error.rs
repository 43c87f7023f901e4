//! KEEPSAKE - Custom Error Types
//! Defines the error hierarchy for the region store.

use std::path::PathBuf;

use thiserror::Error;

/// Custom Result type for the Keepsake engine.
pub type Result<T> = std::result::Result<T, KeepsakeError>;

/// Error types for the Keepsake storage engine.
///
/// Ordinary directory mistakes (adding an existing region, removing a missing
/// one, illegal names) are not errors: those operations return `bool`.
#[derive(Error, Debug)]
pub enum KeepsakeError {
    /// A required file operation (create, delete, rename, write) failed.
    #[error("Failed to {action} {path:?}: {source}")]
    FileOperation {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Codec decode failure (odd length or unrecognized token).
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The store file is unreadable as a container (missing or short header).
    #[error("Invalid store file: {0}")]
    InvalidFile(String),

    /// A zone body that cannot be split into a region name and body.
    #[error("Malformed zone: {0}")]
    MalformedZone(String),

    /// `restore()` was called but no backup file exists.
    #[error("Backup file not found: {0:?}")]
    BackupNotFound(PathBuf),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KeepsakeError {
    /// Wrap an `io::Error` with the action and path that produced it.
    pub(crate) fn file_op(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOperation {
            action,
            path: path.into(),
            source,
        }
    }
}
