//! Error types module
//!
//! All store operations fail with a [`StoreError`]. Validation failures are
//! local and synchronous and are never retried internally; filesystem
//! failures propagate as [`StoreError::Io`].

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be surfaced to a caller.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "INVALID_UPLOAD")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same call could succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Width & height missing")]
    MissingDimensions,

    #[error("Invalid file path: {0}")]
    InvalidFilePath(String),

    #[error("Could not find a free file name after {attempts} attempts")]
    NameGenerationExhausted { attempts: u32 },

    #[error("Invalid thumbnail parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid resize mode: {0}")]
    InvalidResizeMode(String),

    #[error("Original not found: {0}")]
    OriginalNotFound(String),

    #[error("Image processing error: {0}")]
    Processing(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl ErrorMetadata for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            StoreError::InvalidUpload(_) => "INVALID_UPLOAD",
            StoreError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            StoreError::MissingDimensions => "MISSING_DIMENSIONS",
            StoreError::InvalidFilePath(_) => "INVALID_FILE_PATH",
            StoreError::NameGenerationExhausted { .. } => "NAME_GENERATION_EXHAUSTED",
            StoreError::InvalidParameter(_) => "INVALID_PARAMETER",
            StoreError::InvalidResizeMode(_) => "INVALID_RESIZE_MODE",
            StoreError::OriginalNotFound(_) => "ORIGINAL_NOT_FOUND",
            StoreError::Processing(_) => "IMAGE_PROCESSING_ERROR",
            StoreError::Io(_) => "IO_ERROR",
            StoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Internal(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StoreError::InvalidUpload(_)
            | StoreError::UnsupportedFormat(_)
            | StoreError::MissingDimensions
            | StoreError::InvalidFilePath(_)
            | StoreError::InvalidParameter(_)
            | StoreError::InvalidResizeMode(_)
            | StoreError::OriginalNotFound(_) => LogLevel::Debug,
            StoreError::NameGenerationExhausted { .. } | StoreError::Processing(_) => {
                LogLevel::Warn
            }
            StoreError::Io(_) | StoreError::Internal(_) => LogLevel::Error,
        }
    }
}
