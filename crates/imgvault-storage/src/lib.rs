//! Imgvault Storage Library
//!
//! Filesystem-backed storage for original images and their resized
//! derivatives.
//!
//! # Layout
//!
//! For a logical identifier `namespace/basename`:
//!
//! - **Original**: `{root}/{namespace}/o/{shard}/{basename}`
//! - **Thumbnails**: `{root}/{namespace}/t/{shard}/{filename}/{filename}_{w}_{h}_{q}_{flags}.{ext}`
//!
//! where `shard` is two two-character segments taken from the basename.
//! Deleting an original removes its whole thumbnail directory.

pub mod fs;
pub mod layout;
pub mod naming;
pub mod store;
pub mod thumbnail;

pub use layout::StoreLayout;
pub use naming::{
    NameClaimer, NameGenerator, RandomTokenSource, SequenceTokenSource, TokenSource, SUFFIX_LEN,
    TOKEN_LEN,
};
pub use store::{AllowedMimeTypes, ImageStore};
pub use thumbnail::ThumbnailCache;

pub use imgvault_core::{ImageFormat, ResizeMode, StoreConfig, StoreError, StoreResult};
pub use imgvault_processing::{DynamicImage, ImageCodec, MemoryUpload, RasterCodec, TempFileUpload, UploadedFile};
