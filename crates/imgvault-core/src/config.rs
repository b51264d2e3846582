//! Configuration module
//!
//! Store settings are read from the environment (a `.env` file is honored via
//! `dotenvy`). Every setting has a default so an empty environment yields a
//! usable development store.

use std::env;
use std::path::PathBuf;

use crate::params::{FlagPolicy, MAX_DIMENSION};
use crate::paths::{join_path, PathCodec};

const DIRECTORY: &str = "./storage/images";
const PUBLIC_DIRECTORY: &str = "/images";
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Store configuration
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Private root on disk
    pub directory: PathBuf,
    /// Public prefix (URL path or absolute URL) for returned paths
    pub public_directory: String,
    /// Optional sub-store appended to both roots
    pub storage_name: Option<String>,
    pub max_name_attempts: u32,
    /// Largest width or height a thumbnail request may ask for
    pub max_dimension: u32,
    pub confine_paths: bool,
    pub strict_resize_flags: bool,
    /// Non-image content types accepted by `upload` when the caller passes no list
    pub allowed_mime_types: Option<Vec<String>>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            directory: PathBuf::from(DIRECTORY),
            public_directory: PUBLIC_DIRECTORY.to_string(),
            storage_name: None,
            max_name_attempts: MAX_NAME_ATTEMPTS,
            max_dimension: MAX_DIMENSION,
            confine_paths: false,
            strict_resize_flags: false,
            allowed_mime_types: None,
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl StoreConfig {
    /// Build a config rooted at `directory`, everything else defaulted.
    pub fn new(directory: impl Into<PathBuf>, public_directory: impl Into<String>) -> Self {
        StoreConfig {
            directory: directory.into(),
            public_directory: public_directory.into(),
            ..StoreConfig::default()
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let directory = env::var("IMGVAULT_DIRECTORY").unwrap_or_else(|_| DIRECTORY.to_string());
        let public_directory =
            env::var("IMGVAULT_PUBLIC_DIRECTORY").unwrap_or_else(|_| PUBLIC_DIRECTORY.to_string());

        let storage_name = env::var("IMGVAULT_STORAGE_NAME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let max_name_attempts = match env::var("IMGVAULT_MAX_NAME_ATTEMPTS") {
            Ok(v) => v.trim().parse::<u32>().map_err(|_| {
                anyhow::anyhow!("IMGVAULT_MAX_NAME_ATTEMPTS must be a positive number")
            })?,
            Err(_) => MAX_NAME_ATTEMPTS,
        };

        let max_dimension = match env::var("IMGVAULT_MAX_DIMENSION") {
            Ok(v) => v.trim().parse::<u32>().map_err(|_| {
                anyhow::anyhow!("IMGVAULT_MAX_DIMENSION must be a positive number")
            })?,
            Err(_) => MAX_DIMENSION,
        };

        let allowed_mime_types = env::var("IMGVAULT_ALLOWED_MIME_TYPES").ok().map(|s| {
            s.split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        });

        let config = StoreConfig {
            directory: PathBuf::from(directory),
            public_directory,
            storage_name,
            max_name_attempts,
            max_dimension,
            confine_paths: env_flag("IMGVAULT_CONFINE_PATHS"),
            strict_resize_flags: env_flag("IMGVAULT_STRICT_RESIZE_FLAGS"),
            allowed_mime_types,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.directory.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("IMGVAULT_DIRECTORY must not be empty"));
        }

        if self.max_name_attempts == 0 {
            return Err(anyhow::anyhow!(
                "IMGVAULT_MAX_NAME_ATTEMPTS must be greater than zero"
            ));
        }

        if self.max_dimension == 0 {
            return Err(anyhow::anyhow!(
                "IMGVAULT_MAX_DIMENSION must be greater than zero"
            ));
        }

        if let Some(name) = &self.storage_name {
            if name.contains("..") {
                return Err(anyhow::anyhow!(
                    "IMGVAULT_STORAGE_NAME must not contain '..'"
                ));
            }
        }

        Ok(())
    }

    /// Private root with the storage name applied.
    pub fn storage_directory(&self) -> PathBuf {
        match &self.storage_name {
            Some(name) => self.directory.join(name.trim_matches('/')),
            None => self.directory.clone(),
        }
    }

    /// Public prefix with the storage name applied, without a trailing slash.
    pub fn public_storage_directory(&self) -> String {
        let base = match &self.storage_name {
            Some(name) => join_path(&self.public_directory, name),
            None => self.public_directory.clone(),
        };
        base.trim_end_matches('/').to_string()
    }

    pub fn flag_policy(&self) -> FlagPolicy {
        if self.strict_resize_flags {
            FlagPolicy::Strict
        } else {
            FlagPolicy::Lenient
        }
    }

    pub fn path_codec(&self) -> PathCodec {
        if self.confine_paths {
            PathCodec::confined()
        } else {
            PathCodec::new()
        }
    }
}
