//! imgvault processing library
//!
//! The collaborators the store delegates to: an image codec built on the
//! `image` crate and the upload abstraction.

pub mod error;
pub mod image;
pub mod upload;

// Re-export commonly used types
pub use error::ProcessingError;
pub use self::image::{detect_format, is_supported_image, ImageCodec, ImageResize, RasterCodec};
pub use upload::{sanitize_filename, MemoryUpload, TempFileUpload, UploadedFile};

pub use ::image::DynamicImage;
