//! Upload collaborators
//!
//! The store accepts anything implementing [`UploadedFile`]. Two transports
//! are provided: payloads buffered in memory and payloads already spooled to a
//! temporary file.

pub mod memory;
pub mod sanitize;
pub mod temp_file;
pub mod traits;

pub use memory::MemoryUpload;
pub use sanitize::sanitize_filename;
pub use temp_file::TempFileUpload;
pub use traits::UploadedFile;
