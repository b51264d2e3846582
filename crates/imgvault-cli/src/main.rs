//! Imgvault CLI: command-line access to an image store.
//!
//! The store is configured from the environment (`IMGVAULT_DIRECTORY`,
//! `IMGVAULT_PUBLIC_DIRECTORY`, ...; a `.env` file is honored).

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use imgvault_cli::{init_tracing, log_error, ErrorReport};
use imgvault_storage::{
    AllowedMimeTypes, ImageCodec, ImageFormat, ImageStore, MemoryUpload, RasterCodec, ResizeMode,
    StoreConfig, StoreResult,
};
use serde::Serialize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "imgvault", about = "Image store with cached thumbnails")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file under a generated name
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Namespace to store the file under
        #[arg(long)]
        namespace: Option<String>,
        /// Content type to report for files that are not images
        #[arg(long)]
        content_type: Option<String>,
        /// Comma-separated content types accepted for non-image files
        #[arg(long)]
        allow: Option<String>,
    },
    /// Re-encode an image and store it under a generated name
    Save {
        /// Path to the source image
        file: PathBuf,
        /// Output format: jpeg, jpg, png or gif
        #[arg(long)]
        format: String,
        /// Encoder quality (JPEG 1-100, PNG compression 0-9)
        #[arg(long)]
        quality: Option<u32>,
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Get (and generate on first request) a thumbnail
    Thumbnail {
        /// Logical identifier returned by upload or save
        file: String,
        #[arg(long)]
        width: Option<i64>,
        #[arg(long)]
        height: Option<i64>,
        /// Resize mode: fit, shrink-only, stretch, fill, exact
        #[arg(long, default_value = "fit", conflicts_with = "flags")]
        mode: String,
        /// Resize mode as numeric flags (0, 1, 2, 4, 8)
        #[arg(long, allow_negative_numbers = true)]
        flags: Option<i64>,
        #[arg(long)]
        quality: Option<i64>,
    },
    /// Delete an original and all of its thumbnails
    Delete {
        file: String,
    },
    /// Resolve the private and public paths of an original
    Path {
        file: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn stored(store: &ImageStore, file: String) -> StoreResult<serde_json::Value> {
    Ok(json!({
        "path": store.get_path(&file)?,
        "public_path": store.get_public_path(&file)?,
        "file": file,
    }))
}

async fn run(store: &ImageStore, command: Commands) -> StoreResult<serde_json::Value> {
    match command {
        Commands::Upload {
            file,
            namespace,
            content_type,
            allow,
        } => {
            let data = tokio::fs::read(&file).await?;
            let mut upload = MemoryUpload::new(file_name(&file), data);
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }
            let allowed = allow.as_deref().map(AllowedMimeTypes::from);

            let stored_file = store
                .upload(&upload, namespace.as_deref(), allowed.as_ref())
                .await?;
            stored(store, stored_file)
        }
        Commands::Save {
            file,
            format,
            quality,
            namespace,
        } => {
            let format: ImageFormat = format.parse()?;
            let data = tokio::fs::read(&file).await?;
            let image = RasterCodec.decode(&data)?;

            let stored_file = store
                .save(image, format, quality, namespace.as_deref())
                .await?;
            stored(store, stored_file)
        }
        Commands::Thumbnail {
            file,
            width,
            height,
            mode,
            flags,
            quality,
        } => {
            let public_path = match flags {
                Some(flags) => {
                    store
                        .thumbnail_with_flags(&file, width, height, flags, quality)
                        .await?
                }
                None => {
                    let mode: ResizeMode = mode.parse()?;
                    store.thumbnail(&file, width, height, mode, quality).await?
                }
            };
            Ok(json!({ "file": file, "public_path": public_path }))
        }
        Commands::Delete { file } => {
            store.delete(&file).await?;
            Ok(json!({ "success": true, "message": format!("Image {} deleted", file) }))
        }
        Commands::Path { file } => stored(store, file),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = StoreConfig::from_env().context("Invalid store configuration")?;
    let store = ImageStore::new(config)
        .await
        .context("Failed to open image store")?;

    match run(&store, cli.command).await {
        Ok(response) => print_json(&response),
        Err(e) => {
            log_error(&e);
            print_json(&ErrorReport::from(&e))?;
            std::process::exit(1);
        }
    }
}
