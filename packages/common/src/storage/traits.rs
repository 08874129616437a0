use std::path::Path;

use async_trait::async_trait;

use super::error::StorageError;

/// A blob successfully written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Bucket-relative path of the blob.
    pub path: String,
    /// URL a browser can fetch the blob from.
    pub public_url: String,
}

/// Path-addressed blob storage with public read URLs.
///
/// Destination paths are expected to be unique per write (callers namespace
/// them by user and timestamp), so `put_file` refuses to overwrite.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local file to `dest_path` without overwriting existing content.
    async fn put_file(
        &self,
        local_path: &Path,
        dest_path: &str,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Delete blobs by path.
    ///
    /// Attempts every path even when one fails; a missing blob is not an
    /// error. Returns the first failure encountered, if any.
    async fn remove(&self, paths: &[String]) -> Result<(), StorageError>;
}
