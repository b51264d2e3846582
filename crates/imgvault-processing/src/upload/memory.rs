//! In-memory upload.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use imgvault_core::ImageFormat;
use tokio::io::AsyncWriteExt;

use crate::image::{detect_format, is_supported_image};
use crate::upload::sanitize::sanitize_filename;
use crate::upload::traits::UploadedFile;

/// An upload whose payload is already buffered in memory.
#[derive(Clone, Debug)]
pub struct MemoryUpload {
    original_name: String,
    data: Bytes,
    declared_content_type: Option<String>,
    detected: Option<ImageFormat>,
    is_image: bool,
    error: Option<String>,
}

impl MemoryUpload {
    pub fn new(original_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let is_image = is_supported_image(&data);
        let detected = if is_image { detect_format(&data) } else { None };

        MemoryUpload {
            original_name: original_name.into(),
            data,
            declared_content_type: None,
            detected,
            is_image,
            error: None,
        }
    }

    /// Content type reported by the client, used when the payload is not an image
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.declared_content_type = Some(content_type.into().trim().to_lowercase());
        self
    }

    /// An upload whose transfer did not complete
    pub fn failed(original_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut upload = MemoryUpload::new(original_name, Bytes::new());
        upload.error = Some(reason.into());
        upload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl UploadedFile for MemoryUpload {
    fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn is_image(&self) -> bool {
        self.is_image
    }

    fn content_type(&self) -> Option<&str> {
        match self.detected {
            Some(format) => Some(format.mime_type()),
            None => self.declared_content_type.as_deref(),
        }
    }

    fn sanitized_name(&self) -> String {
        sanitize_filename(&self.original_name)
    }

    async fn persist_to(&self, destination: &Path) -> std::io::Result<u64> {
        let mut file = tokio::fs::File::create(destination).await?;
        file.write_all(&self.data).await?;
        file.sync_all().await?;
        Ok(self.data.len() as u64)
    }
}
