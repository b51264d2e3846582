use imgvault_core::StoreError;

/// Errors raised by the image codec and upload collaborators
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => ProcessingError::Io(e),
            image::ImageError::Unsupported(e) => ProcessingError::UnsupportedFormat(e.to_string()),
            other => ProcessingError::Decode(other.to_string()),
        }
    }
}

impl From<ProcessingError> for StoreError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::UnsupportedFormat(msg) => StoreError::UnsupportedFormat(msg),
            ProcessingError::Io(e) => StoreError::Io(e),
            other => StoreError::Processing(other.to_string()),
        }
    }
}
