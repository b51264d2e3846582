use std::path::PathBuf;

use imgvault_core::{join_path, PathCodec, StoreConfig, StoreResult};

/// Resolves logical identifiers against the private and public roots.
///
/// Pure path arithmetic; nothing here touches the filesystem.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    directory: PathBuf,
    public_directory: String,
    paths: PathCodec,
}

impl StoreLayout {
    pub fn new(directory: impl Into<PathBuf>, public_directory: &str, paths: PathCodec) -> Self {
        StoreLayout {
            directory: directory.into(),
            public_directory: public_directory.trim_end_matches('/').to_string(),
            paths,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        StoreLayout::new(
            config.storage_directory(),
            &config.public_storage_directory(),
            config.path_codec(),
        )
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    pub fn public_directory(&self) -> &str {
        &self.public_directory
    }

    pub fn paths(&self) -> &PathCodec {
        &self.paths
    }

    /// Filesystem path of a codec-relative path
    pub fn private_path(&self, relative: &str) -> PathBuf {
        self.directory.join(relative.trim_start_matches('/'))
    }

    /// Public path of a codec-relative path
    pub fn public_path(&self, relative: &str) -> String {
        join_path(&self.public_directory, relative)
    }

    pub fn original_path(&self, file: &str) -> StoreResult<PathBuf> {
        Ok(self.private_path(&self.paths.format_original_path(file)?))
    }

    pub fn public_original_path(&self, file: &str) -> StoreResult<String> {
        Ok(self.public_path(&self.paths.format_original_path(file)?))
    }

    pub fn thumbnail_directory(&self, file: &str) -> StoreResult<PathBuf> {
        Ok(self.private_path(&self.paths.format_thumbnail_directory(file)?))
    }
}
