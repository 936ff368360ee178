//! Error types for `imgdeck-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use std::path::PathBuf;

/// Unified error type for all core operations.
///
/// Filesystem and collaborator failures are converted into user-facing
/// [`crate::Event`]s at the view boundary; this type never reaches the
/// rendering layer directly.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// A directory was expected but the path points to a file.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Checking another item would grow the selection past its cap.
    #[error("at most {limit} items can be selected at once")]
    SelectionLimitExceeded { limit: usize },

    /// A batch operation succeeded for some items and failed for others.
    #[error("{succeeded} succeeded, {failed} failed")]
    PartialFailure { succeeded: usize, failed: usize },

    /// A batch operation failed as a whole.
    #[error("operation failed: {reason}")]
    TotalFailure { reason: String },

    /// Another batch operation is still in flight.
    #[error("another operation is still running")]
    Busy,

    /// A destructive operation was executed without user confirmation.
    #[error("operation requires confirmation")]
    ConfirmationRequired,

    /// A file or directory name is invalid (empty, contains path separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// An operation parameter is out of range or malformed.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Decoding, encoding or rendering an image failed.
    #[error("image error: {0}")]
    Image(String),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The user cancelled an interactive operation.
    #[error("operation cancelled")]
    Cancelled,

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Maps an I/O error on `path` to the most specific variant.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.into()),
            _ => CoreError::Io(err),
        }
    }
}

impl From<image::ImageError> for CoreError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => CoreError::Io(e),
            other => CoreError::Image(other.to_string()),
        }
    }
}

/// Convenience alias used throughout `imgdeck-core`.
pub type CoreResult<T> = Result<T, CoreError>;
