//! Image store
//!
//! Owns the storage roots and ties name generation, the filesystem helpers
//! and the thumbnail cache together behind the public operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use imgvault_core::{
    format_file_path, ImageFormat, ResizeMode, StoreConfig, StoreError, StoreResult,
};
use imgvault_processing::{DynamicImage, ImageCodec, RasterCodec, UploadedFile};

use crate::fs;
use crate::layout::StoreLayout;
use crate::naming::{NameClaimer, NameGenerator, RandomTokenSource, TokenSource};
use crate::thumbnail::ThumbnailCache;

/// Content types accepted for uploads that are not recognized images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMimeTypes(Vec<String>);

impl AllowedMimeTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AllowedMimeTypes(
            types
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }

    /// Parameters such as `; charset=utf-8` are ignored.
    pub fn contains(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        self.0.iter().any(|t| *t == essence)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Comma-separated list, e.g. `"application/pdf, text/plain"`
impl From<&str> for AllowedMimeTypes {
    fn from(list: &str) -> Self {
        AllowedMimeTypes::new(list.split(','))
    }
}

impl From<Vec<String>> for AllowedMimeTypes {
    fn from(types: Vec<String>) -> Self {
        AllowedMimeTypes::new(types)
    }
}

/// Claims a name by exclusively creating its original path.
struct Reservation<'a> {
    layout: &'a StoreLayout,
    namespace: Option<&'a str>,
}

#[async_trait]
impl NameClaimer for Reservation<'_> {
    async fn claim(&self, name: &str) -> StoreResult<bool> {
        let file = format_file_path(name, self.namespace);
        let path = self.layout.original_path(&file)?;
        fs::ensure_parent_dir(&path).await?;
        Ok(fs::reserve(&path).await?)
    }
}

/// Filesystem-backed store for original images and their thumbnails
pub struct ImageStore {
    config: StoreConfig,
    layout: StoreLayout,
    codec: Arc<dyn ImageCodec>,
    names: NameGenerator,
    thumbnails: ThumbnailCache,
    allowed_mime_types: Option<AllowedMimeTypes>,
}

impl ImageStore {
    /// Create a store with the default codec and random names.
    ///
    /// The private root is created if it does not exist.
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        Self::with_parts(config, Arc::new(RasterCodec), Arc::new(RandomTokenSource)).await
    }

    pub async fn with_parts(
        config: StoreConfig,
        codec: Arc<dyn ImageCodec>,
        tokens: Arc<dyn TokenSource>,
    ) -> StoreResult<Self> {
        let layout = StoreLayout::from_config(&config);

        tokio::fs::create_dir_all(layout.directory()).await?;

        let thumbnails =
            ThumbnailCache::new(layout.clone(), Arc::clone(&codec), config.flag_policy())
                .with_max_dimension(config.max_dimension);
        let names = NameGenerator::new(tokens, config.max_name_attempts);
        let allowed_mime_types = config
            .allowed_mime_types
            .as_ref()
            .map(|types| AllowedMimeTypes::new(types));

        tracing::debug!(
            directory = %layout.directory().display(),
            public_directory = %layout.public_directory(),
            "Image store ready"
        );

        Ok(ImageStore {
            config,
            layout,
            codec,
            names,
            thumbnails,
            allowed_mime_types,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Store an uploaded file and return its logical identifier.
    ///
    /// Non-image payloads are only accepted when their content type is in
    /// `allowed_mime_types`, or in the configured list when none is given.
    pub async fn upload(
        &self,
        uploaded: &dyn UploadedFile,
        namespace: Option<&str>,
        allowed_mime_types: Option<&AllowedMimeTypes>,
    ) -> StoreResult<String> {
        if !uploaded.is_ok() {
            return Err(StoreError::InvalidUpload("File is broken".to_string()));
        }

        if !uploaded.is_image() {
            let content_type = uploaded.content_type().unwrap_or("unknown");
            let allowed = allowed_mime_types
                .or(self.allowed_mime_types.as_ref())
                .is_some_and(|types| types.contains(content_type));

            if !allowed {
                return Err(StoreError::InvalidUpload(format!(
                    "File must be image, {} given",
                    content_type
                )));
            }
        }

        let start = Instant::now();
        let claimer = Reservation {
            layout: &self.layout,
            namespace,
        };
        let name = self
            .names
            .generate_unique_name(&claimer, &uploaded.sanitized_name())
            .await?;
        let file = format_file_path(&name, namespace);
        let path = self.layout.original_path(&file)?;

        let size = match fs::persist_atomic(uploaded, &path).await {
            Ok(size) => size,
            Err(e) => {
                self.release_reservation(&path).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            file = %file,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload stored"
        );

        Ok(file)
    }

    /// Encode `image` and store it under a generated name.
    pub async fn save(
        &self,
        image: DynamicImage,
        format: ImageFormat,
        quality: Option<u32>,
        namespace: Option<&str>,
    ) -> StoreResult<String> {
        let start = Instant::now();

        let codec = Arc::clone(&self.codec);
        let data = tokio::task::spawn_blocking(move || codec.encode(&image, format, quality))
            .await
            .map_err(|e| StoreError::Internal(format!("Encode task failed: {}", e)))??;

        let claimer = Reservation {
            layout: &self.layout,
            namespace,
        };
        let name = self
            .names
            .generate_unique_generated_name(&claimer, format)
            .await?;
        let file = format_file_path(&name, namespace);
        let path = self.layout.original_path(&file)?;

        if let Err(e) = fs::write_atomic(&path, &data).await {
            self.release_reservation(&path).await;
            return Err(e.into());
        }

        tracing::info!(
            file = %file,
            path = %path.display(),
            format = %format,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image saved"
        );

        Ok(file)
    }

    /// Remove an original and every cached thumbnail of it.
    ///
    /// Missing files are not an error. Thumbnail generations of `file`
    /// already in progress finish before anything is removed.
    pub async fn delete(&self, file: &str) -> StoreResult<()> {
        let (removed_original, removed_thumbnails) = self.thumbnails.remove(file).await?;

        tracing::info!(
            file = %file,
            removed_original,
            removed_thumbnails,
            "Image deleted"
        );

        Ok(())
    }

    /// Filesystem path of an original
    pub fn get_path(&self, file: &str) -> StoreResult<PathBuf> {
        self.layout.original_path(file)
    }

    /// Public path of an original
    pub fn get_public_path(&self, file: &str) -> StoreResult<String> {
        self.layout.public_original_path(file)
    }

    /// Public path of a thumbnail, generated on first request.
    pub async fn thumbnail(
        &self,
        file: &str,
        width: Option<i64>,
        height: Option<i64>,
        mode: ResizeMode,
        quality: Option<i64>,
    ) -> StoreResult<String> {
        self.thumbnails
            .get(file, width, height, quality, mode)
            .await
    }

    /// [`thumbnail`](Self::thumbnail) with the mode given as numeric flags.
    pub async fn thumbnail_with_flags(
        &self,
        file: &str,
        width: Option<i64>,
        height: Option<i64>,
        flags: i64,
        quality: Option<i64>,
    ) -> StoreResult<String> {
        self.thumbnails
            .get_with_flags(file, width, height, quality, flags)
            .await
    }

    async fn release_reservation(&self, path: &Path) {
        if let Err(e) = fs::remove_file_if_exists(path).await {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove name reservation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_mime_types_from_list() {
        let allowed = AllowedMimeTypes::from("application/pdf, Text/Plain,,");
        assert!(allowed.contains("application/pdf"));
        assert!(allowed.contains("text/plain; charset=utf-8"));
        assert!(!allowed.contains("image/svg+xml"));
        assert!(!allowed.is_empty());
    }

    #[test]
    fn test_allowed_mime_types_from_vec() {
        let allowed = AllowedMimeTypes::from(vec!["application/zip".to_string()]);
        assert!(allowed.contains("APPLICATION/ZIP"));
        assert!(AllowedMimeTypes::default().is_empty());
    }
}
