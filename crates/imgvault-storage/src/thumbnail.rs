//! Thumbnail cache
//!
//! A thumbnail's storage path encodes every parameter that affects its
//! content, so the path itself is the cache key. A hit is a plain existence
//! check. Misses for the same key are serialized by an in-process lock and
//! re-checked under it, so concurrent identical requests encode once.
//! Population always goes through temp-file-then-rename, which keeps other
//! processes from ever observing a partial file.
//!
//! Generation holds a shared lock on the original's thumbnail directory and
//! [`ThumbnailCache::remove`] holds it exclusively, so a thumbnail can never
//! be written after its original was deleted.

use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use imgvault_core::{
    FlagPolicy, ImageFormat, ResizeMode, StoreError, StoreResult, ThumbnailParams, MAX_DIMENSION,
};
use imgvault_processing::image::ResizeDimensions;
use imgvault_processing::{ImageCodec, ImageResize};
use tokio::sync::{Mutex, RwLock};

use crate::fs;
use crate::layout::StoreLayout;

/// Async locks by key. An entry only lives while someone holds or awaits it.
struct KeyedLocks<L> {
    locks: DashMap<String, Arc<L>>,
}

impl<L: Default> KeyedLocks<L> {
    fn new() -> Self {
        KeyedLocks {
            locks: DashMap::new(),
        }
    }

    fn acquire(&self, key: String) -> KeyedLock<'_, L> {
        let lock = self.locks.entry(key.clone()).or_default().clone();
        KeyedLock {
            locks: &self.locks,
            key,
            lock,
        }
    }

    fn len(&self) -> usize {
        self.locks.len()
    }
}

struct KeyedLock<'a, L> {
    locks: &'a DashMap<String, Arc<L>>,
    key: String,
    lock: Arc<L>,
}

impl<L> Deref for KeyedLock<'_, L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.lock
    }
}

impl<L> Drop for KeyedLock<'_, L> {
    fn drop(&mut self) {
        // One reference in the map, one in `self.lock`.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
    }
}

pub struct ThumbnailCache {
    layout: StoreLayout,
    codec: Arc<dyn ImageCodec>,
    policy: FlagPolicy,
    max_dimension: u32,
    in_flight: KeyedLocks<Mutex<()>>,
    originals: KeyedLocks<RwLock<()>>,
}

impl ThumbnailCache {
    pub fn new(layout: StoreLayout, codec: Arc<dyn ImageCodec>, policy: FlagPolicy) -> Self {
        ThumbnailCache {
            layout,
            codec,
            policy,
            max_dimension: MAX_DIMENSION,
            in_flight: KeyedLocks::new(),
            originals: KeyedLocks::new(),
        }
    }

    /// Largest accepted width or height. The scaled image before any crop
    /// may hold at most `max_dimension²` pixels.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    /// Public path of the thumbnail of `file`, generating it on a miss.
    ///
    /// Non-positive width, height and quality count as absent.
    pub async fn get(
        &self,
        file: &str,
        width: Option<i64>,
        height: Option<i64>,
        quality: Option<i64>,
        mode: ResizeMode,
    ) -> StoreResult<String> {
        let params =
            ThumbnailParams::with_max_dimension(width, height, quality, mode, self.max_dimension)?;
        self.get_with_params(file, &params).await
    }

    /// Like [`get`](Self::get) with the mode given as numeric flags, parsed
    /// under the cache's [`FlagPolicy`].
    pub async fn get_with_flags(
        &self,
        file: &str,
        width: Option<i64>,
        height: Option<i64>,
        quality: Option<i64>,
        flags: i64,
    ) -> StoreResult<String> {
        let mode = ResizeMode::from_flags(flags, self.policy)?;
        self.get(file, width, height, quality, mode).await
    }

    pub async fn get_with_params(
        &self,
        file: &str,
        params: &ThumbnailParams,
    ) -> StoreResult<String> {
        let relative = self.layout.paths().format_thumbnail_path(file, params)?;
        let directory = self.layout.paths().format_thumbnail_directory(file)?;
        let target = self.layout.private_path(&relative);
        let public = self.layout.public_path(&relative);

        if fs::exists(&target).await? {
            tracing::debug!(file = %file, path = %target.display(), "Thumbnail cache hit");
            return Ok(public);
        }

        let key = self.in_flight.acquire(relative);
        let _populating = key.lock().await;

        if fs::exists(&target).await? {
            tracing::debug!(
                file = %file,
                path = %target.display(),
                "Thumbnail populated by a concurrent request"
            );
            return Ok(public);
        }

        let original = self.originals.acquire(directory);
        let _reading = original.read().await;
        self.generate(file, params, &target).await?;

        Ok(public)
    }

    /// Delete an original and its whole thumbnail directory.
    ///
    /// Waits for generations already reading the original. Returns whether
    /// the original and the directory existed.
    pub async fn remove(&self, file: &str) -> StoreResult<(bool, bool)> {
        let original_path = self.layout.original_path(file)?;
        let directory_path = self.layout.thumbnail_directory(file)?;
        let directory = self.layout.paths().format_thumbnail_directory(file)?;

        let original = self.originals.acquire(directory);
        let _removing = original.write().await;

        let removed_original = fs::remove_file_if_exists(&original_path).await?;
        let removed_thumbnails = fs::remove_dir_all_if_exists(&directory_path).await?;
        Ok((removed_original, removed_thumbnails))
    }

    /// Filesystem path a thumbnail would be cached at. Nothing is generated.
    pub fn cache_path(&self, file: &str, params: &ThumbnailParams) -> StoreResult<PathBuf> {
        let relative = self.layout.paths().format_thumbnail_path(file, params)?;
        Ok(self.layout.private_path(&relative))
    }

    /// Number of cache keys currently being populated
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of originals currently locked for generation or removal
    pub fn originals_locked(&self) -> usize {
        self.originals.len()
    }

    async fn generate(
        &self,
        file: &str,
        params: &ThumbnailParams,
        target: &Path,
    ) -> StoreResult<()> {
        let start = Instant::now();
        let original = self.layout.original_path(file)?;

        let data = match tokio::fs::read(&original).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::OriginalNotFound(file.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let extension = self.layout.paths().parse(file)?.extension;
        let format = extension
            .and_then(ImageFormat::from_extension)
            .or_else(|| self.codec.sniff_format(&data))
            .ok_or_else(|| {
                StoreError::UnsupportedFormat(format!("Cannot determine format of '{}'", file))
            })?;

        let codec = Arc::clone(&self.codec);
        let params = *params;
        let max_pixels = u64::from(self.max_dimension).pow(2);
        let encoded = tokio::task::spawn_blocking(move || -> StoreResult<Vec<u8>> {
            let image = codec.decode(&data)?;

            let (width, height) = ImageResize::calculate_dimensions(
                image.width(),
                image.height(),
                ResizeDimensions {
                    width: params.width,
                    height: params.height,
                },
                params.mode,
            );
            if u64::from(width) * u64::from(height) > max_pixels {
                return Err(StoreError::InvalidParameter(format!(
                    "scaling to {}x{} exceeds the size limit",
                    width, height
                )));
            }

            let resized = codec.resize(&image, &params);
            Ok(codec.encode(&resized, format, params.quality)?)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("Thumbnail task failed: {}", e)))??;

        fs::write_atomic(target, &encoded).await?;

        tracing::info!(
            file = %file,
            path = %target.display(),
            size_bytes = encoded.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail generated"
        );

        Ok(())
    }
}
