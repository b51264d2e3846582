//! Storage path derivation
//!
//! Every stored asset is addressed by a logical identifier of the form
//! `[namespace/]basename`. The layout under a storage root is:
//!
//! - **Original**: `{namespace}/o/{shard}/{basename}`
//! - **Thumbnails**: `{namespace}/t/{shard}/{filename}/{filename}_{w}_{h}_{q}_{flags}.{ext}`
//!
//! where `shard` is `ab/cd` taken from the first four characters of the
//! basename (padded with `0`). Nothing in this module touches the filesystem.
//!
//! Identifiers are not checked for `..` segments unless the codec is built
//! with [`PathCodec::confined`]; callers should only pass identifiers this
//! store produced.

use crate::error::{StoreError, StoreResult};
use crate::params::ThumbnailParams;

const ORIGINALS_DIR: &str = "o";
const THUMBNAILS_DIR: &str = "t";
const SHARD_PADDING: &str = "00";

/// A parsed logical identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalFile<'a> {
    pub namespace: Option<&'a str>,
    pub basename: &'a str,
    pub filename: &'a str,
    pub extension: Option<&'a str>,
}

impl<'a> LogicalFile<'a> {
    pub fn parse(file: &'a str) -> StoreResult<Self> {
        let file = file.trim();
        if file.is_empty() {
            return Err(StoreError::InvalidFilePath("Missing filepath".to_string()));
        }

        let (namespace, basename) = match file.rsplit_once('/') {
            Some((ns, base)) => ((!ns.is_empty()).then_some(ns), base),
            None => (None, file),
        };

        if basename.is_empty() {
            return Err(StoreError::InvalidFilePath(format!(
                "Missing file name in '{}'",
                file
            )));
        }

        let (filename, extension) = match basename.rsplit_once('.') {
            Some((name, ext)) => (name, Some(ext)),
            None => (basename, None),
        };

        Ok(LogicalFile {
            namespace,
            basename,
            filename,
            extension,
        })
    }

    pub fn shard(&self) -> String {
        shard_key(self.basename)
    }

    fn prefix(&self, kind: &str) -> String {
        match self.namespace {
            Some(ns) => format!("{}/{}/{}", ns, kind, self.shard()),
            None => format!("{}/{}", kind, self.shard()),
        }
    }
}

/// Two-level shard directory for a basename: `ab/cd`.
pub fn shard_key(basename: &str) -> String {
    let padded: Vec<char> = basename.chars().chain(SHARD_PADDING.chars()).collect();
    let first: String = padded[..2].iter().collect();
    let second: String = padded.iter().skip(2).take(2).collect();
    let second = if second.chars().count() < 2 {
        format!("{:0<2}", second)
    } else {
        second
    };
    format!("{}/{}", first, second)
}

/// Join a relative path onto a base with a single `/` between them.
pub fn join_path(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');

    match (base.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, relative),
    }
}

/// Build a logical identifier from a stored name and an optional namespace.
pub fn format_file_path(name: &str, namespace: Option<&str>) -> String {
    let namespace = namespace.unwrap_or("").trim_matches('/');
    let name = name.trim_matches('/');
    format!("{}/{}", namespace, name)
        .trim_start_matches('/')
        .to_string()
}

/// Derives relative storage paths from logical identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCodec {
    confined: bool,
}

impl PathCodec {
    pub fn new() -> Self {
        PathCodec { confined: false }
    }

    /// A codec that rejects identifiers which could escape the storage root.
    pub fn confined() -> Self {
        PathCodec { confined: true }
    }

    pub fn is_confined(&self) -> bool {
        self.confined
    }

    pub fn parse<'a>(&self, file: &'a str) -> StoreResult<LogicalFile<'a>> {
        if self.confined {
            check_confined(file.trim())?;
        }
        LogicalFile::parse(file)
    }

    pub fn format_original_path(&self, file: &str) -> StoreResult<String> {
        let parsed = self.parse(file)?;
        Ok(format!("{}/{}", parsed.prefix(ORIGINALS_DIR), parsed.basename))
    }

    /// Directory holding every cached variant of `file`.
    pub fn format_thumbnail_directory(&self, file: &str) -> StoreResult<String> {
        let parsed = self.parse(file)?;
        Ok(format!(
            "{}/{}",
            parsed.prefix(THUMBNAILS_DIR),
            parsed.filename
        ))
    }

    /// Cache path for one parameter set. This path is the cache key.
    pub fn format_thumbnail_path(
        &self,
        file: &str,
        params: &ThumbnailParams,
    ) -> StoreResult<String> {
        let parsed = self.parse(file)?;
        let stem = format!("{}_{}", parsed.filename, params.encode());
        let name = match parsed.extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem,
        };

        Ok(format!(
            "{}/{}/{}",
            parsed.prefix(THUMBNAILS_DIR),
            parsed.filename,
            name
        ))
    }
}

fn check_confined(file: &str) -> StoreResult<()> {
    if file.starts_with('/') || file.contains('\\') || file.contains('\0') {
        return Err(StoreError::InvalidFilePath(format!(
            "'{}' is not a relative identifier",
            file
        )));
    }

    if file
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StoreError::InvalidFilePath(format!(
            "'{}' escapes the storage root",
            file
        )));
    }

    Ok(())
}
