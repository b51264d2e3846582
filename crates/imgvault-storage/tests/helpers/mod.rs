//! Test helpers: build an `ImageStore` over a temporary root.
//!
//! Run from workspace root: `cargo test -p imgvault-storage`.

#![allow(dead_code)]

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use imgvault_core::{ImageFormat, ThumbnailParams};
use imgvault_processing::{DynamicImage, ImageCodec, ProcessingError, RasterCodec};
use imgvault_storage::{
    ImageStore, RandomTokenSource, SequenceTokenSource, StoreConfig, TokenSource,
};
use tempfile::TempDir;

pub const PUBLIC_DIRECTORY: &str = "/static/images";

/// Wraps [`RasterCodec`], counting encodes and optionally slowing them down.
#[derive(Default)]
pub struct CountingCodec {
    inner: RasterCodec,
    encodes: AtomicUsize,
    delay: Duration,
}

impl CountingCodec {
    pub fn with_delay(delay: Duration) -> Self {
        CountingCodec {
            delay,
            ..CountingCodec::default()
        }
    }

    pub fn encodes(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }
}

impl ImageCodec for CountingCodec {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, ProcessingError> {
        self.inner.decode(data)
    }

    fn resize(&self, image: &DynamicImage, params: &ThumbnailParams) -> DynamicImage {
        self.inner.resize(image, params)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: ImageFormat,
        quality: Option<u32>,
    ) -> Result<Vec<u8>, ProcessingError> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.encode(image, format, quality)
    }
}

/// Test store: the store plus the owned temporary root.
pub struct TestStore {
    pub store: ImageStore,
    pub codec: Arc<CountingCodec>,
    pub _temp_dir: TempDir,
}

impl TestStore {
    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Write an original directly, bypassing name generation.
    pub async fn put_original(&self, file: &str, data: &[u8]) -> PathBuf {
        let path = self.store.get_path(file).expect("Invalid file");
        imgvault_storage::fs::write_atomic(&path, data)
            .await
            .expect("Failed to write original");
        path
    }
}

pub async fn setup_test_store() -> TestStore {
    build(StoreConfig::default(), CountingCodec::default(), None).await
}

/// Store whose generated names draw from `tokens` in order.
pub async fn setup_test_store_with_tokens(tokens: &[&str]) -> TestStore {
    let source = SequenceTokenSource::new(tokens.iter().copied());
    build(StoreConfig::default(), CountingCodec::default(), Some(Arc::new(source))).await
}

pub async fn setup_test_store_with_codec(codec: CountingCodec) -> TestStore {
    build(StoreConfig::default(), codec, None).await
}

pub async fn setup_test_store_with_config(config: StoreConfig, tokens: &[&str]) -> TestStore {
    let source = SequenceTokenSource::new(tokens.iter().copied());
    build(config, CountingCodec::default(), Some(Arc::new(source))).await
}

async fn build(
    mut config: StoreConfig,
    codec: CountingCodec,
    tokens: Option<Arc<dyn TokenSource>>,
) -> TestStore {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    config.directory = temp_dir.path().to_path_buf();
    config.public_directory = PUBLIC_DIRECTORY.to_string();

    let codec = Arc::new(codec);
    let tokens = tokens.unwrap_or_else(|| Arc::new(RandomTokenSource) as Arc<dyn TokenSource>);
    let store = ImageStore::with_parts(config, codec.clone(), tokens)
        .await
        .expect("Failed to create store");

    TestStore {
        store,
        codec,
        _temp_dir: temp_dir,
    }
}
