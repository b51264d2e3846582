//! Filesystem primitives
//!
//! Everything that creates files under a storage root goes through here so
//! that a path is only ever visible once its content is complete:
//!
//! - names are claimed with an exclusive create ([`reserve`]);
//! - content is written to a sibling temp file and renamed into place
//!   ([`write_atomic`], [`persist_atomic`]);
//! - removals treat an already-missing path as success.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use imgvault_processing::UploadedFile;
use rand::Rng;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const TEMP_SUFFIX_LEN: usize = 8;
const TEMP_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Sibling temp path for `path`: `.{name}.{random}.tmp` in the same directory.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut rng = rand::rng();
    let suffix: String = (0..TEMP_SUFFIX_LEN)
        .map(|_| TEMP_CHARSET[rng.random_range(0..TEMP_CHARSET.len())] as char)
        .collect();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!(".{}.{}.tmp", name, suffix))
}

pub async fn exists(path: &Path) -> std::io::Result<bool> {
    fs::try_exists(path).await
}

/// Ensure parent directory exists. An existing directory is not an error.
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Claim `path` by creating it exclusively.
///
/// Returns `false` when something already exists there. The placeholder is
/// empty until replaced by [`write_atomic`] or [`persist_atomic`].
pub async fn reserve(path: &Path) -> std::io::Result<bool> {
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

async fn discard(temp: &Path) {
    if let Err(e) = remove_file_if_exists(temp).await {
        tracing::warn!(path = %temp.display(), error = %e, "Failed to remove temp file");
    }
}

/// Write `data` to `path` via a temp file and rename. Parent directories are created.
pub async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    ensure_parent_dir(path).await?;
    let temp = temp_path_for(path);

    let result = async {
        let mut file = fs::File::create(&temp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        discard(&temp).await;
    }
    result
}

/// Move an upload's payload to `path` via a temp file and rename.
pub async fn persist_atomic(upload: &dyn UploadedFile, path: &Path) -> std::io::Result<u64> {
    ensure_parent_dir(path).await?;
    let temp = temp_path_for(path);

    let result: std::io::Result<u64> = async {
        let size = upload.persist_to(&temp).await?;
        fs::rename(&temp, path).await?;
        Ok(size)
    }
    .await;

    if result.is_err() {
        discard(&temp).await;
    }
    result
}

/// Remove a file. Returns whether something was removed.
pub async fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove a directory tree. Returns whether something was removed.
pub async fn remove_dir_all_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
