//! Upload collaborator trait.

use std::path::Path;

use async_trait::async_trait;

/// A file received by an upload layer (HTTP multipart, CLI, ...).
///
/// The store only consumes these signals; parsing the transport is the
/// implementor's job.
#[async_trait]
pub trait UploadedFile: Send + Sync {
    /// Whether the transfer completed without error
    fn is_ok(&self) -> bool;

    /// Whether the payload is a decodable image of a supported format
    fn is_image(&self) -> bool;

    /// Content type of the payload, if known
    fn content_type(&self) -> Option<&str>;

    /// Client-supplied file name, reduced to a safe single path segment
    fn sanitized_name(&self) -> String;

    /// Move the payload bytes to `destination`. Returns the number of bytes written.
    async fn persist_to(&self, destination: &Path) -> std::io::Result<u64>;
}
