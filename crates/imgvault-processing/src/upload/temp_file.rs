//! Upload spooled to a temporary file by the transport layer.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use imgvault_core::ImageFormat;
use tokio::fs;

use crate::image::{detect_format, is_supported_image};
use crate::upload::sanitize::sanitize_filename;
use crate::upload::traits::UploadedFile;

/// Bytes read from the head of the file to recognize images
const SNIFF_LEN: u64 = 64 * 1024;

/// An upload that already lives on disk. Persisting moves the file.
#[derive(Clone, Debug)]
pub struct TempFileUpload {
    path: PathBuf,
    original_name: String,
    declared_content_type: Option<String>,
    detected: Option<ImageFormat>,
    is_image: bool,
}

impl TempFileUpload {
    /// Inspect the spooled file at `path`.
    pub async fn open(
        path: impl Into<PathBuf>,
        original_name: impl Into<String>,
        content_type: Option<String>,
    ) -> std::io::Result<Self> {
        let path = path.into();
        let sniff_path = path.clone();

        let head = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
            let mut head = Vec::new();
            std::fs::File::open(&sniff_path)?
                .take(SNIFF_LEN)
                .read_to_end(&mut head)?;
            Ok(head)
        })
        .await
        .map_err(std::io::Error::other)??;

        let is_image = is_supported_image(&head);
        let detected = if is_image { detect_format(&head) } else { None };

        Ok(TempFileUpload {
            path,
            original_name: original_name.into(),
            declared_content_type: content_type.map(|ct| ct.trim().to_lowercase()),
            detected,
            is_image,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadedFile for TempFileUpload {
    fn is_ok(&self) -> bool {
        self.path.is_file()
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
        let size = fs::metadata(&self.path).await?.len();

        if let Err(e) = fs::rename(&self.path, destination).await {
            // Rename fails across filesystems; fall back to copy + remove.
            tracing::debug!(
                error = %e,
                from = %self.path.display(),
                to = %destination.display(),
                "Rename failed, copying upload instead"
            );
            fs::copy(&self.path, destination).await?;
            fs::remove_file(&self.path).await?;
        }

        Ok(size)
    }
}
