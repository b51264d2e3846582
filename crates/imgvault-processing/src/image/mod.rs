//! Image processing module
//!
//! - Codec collaborator (decode, resize, encode)
//! - Resize geometry for the five resize strategies

pub mod codec;
pub mod resize;

pub use codec::{detect_format, is_supported_image, ImageCodec, RasterCodec};
pub use resize::{ImageResize, ResizeDimensions};
