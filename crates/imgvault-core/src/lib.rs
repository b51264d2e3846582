//! imgvault core library
//!
//! Logical identifiers, resize parameters, path derivation, error types and
//! configuration shared by every imgvault crate. This crate performs no I/O
//! beyond reading the environment.

pub mod config;
pub mod error;
pub mod format;
pub mod params;
pub mod paths;

// Re-export commonly used types
pub use config::StoreConfig;
pub use error::{ErrorMetadata, LogLevel, StoreError, StoreResult};
pub use format::ImageFormat;
pub use params::{
    FlagPolicy, ResizeMode, ThumbnailParams, MAX_DIMENSION, MAX_QUALITY, QUALITY_SENTINEL,
};
pub use paths::{format_file_path, join_path, shard_key, LogicalFile, PathCodec};
