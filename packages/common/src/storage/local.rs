use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{BlobStore, StoredObject};

/// Filesystem-backed blob store for development and tests.
///
/// Blobs live under `root` at their storage path; the server exposes the
/// root as a static directory, so public URLs are `{public_base}/{path}`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    /// Create a local blob store rooted at `root`, creating it if needed.
    pub async fn new(root: PathBuf, public_base: String) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, dest_path: &str) -> Result<PathBuf, StorageError> {
        // Paths are server-constructed, but never follow one outside the root.
        if dest_path.starts_with('/')
            || dest_path
                .split('/')
                .any(|segment| segment.is_empty() || segment == "..")
        {
            return Err(StorageError::Backend(format!(
                "invalid storage path: {dest_path}"
            )));
        }
        Ok(self.root.join(dest_path))
    }

    fn public_url(&self, dest_path: &str) -> String {
        format!("{}/{}", self.public_base, dest_path)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_file(
        &self,
        local_path: &Path,
        dest_path: &str,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let target = self.blob_path(dest_path)?;

        if fs::try_exists(&target).await? {
            return Err(StorageError::AlreadyExists(dest_path.to_string()));
        }

        let data = fs::read(local_path).await?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, data).await?;

        Ok(StoredObject {
            path: dest_path.to_string(),
            public_url: self.public_url(dest_path),
        })
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        let mut first_error = None;

        for path in paths {
            let target = match self.blob_path(path) {
                Ok(target) => target,
                Err(e) => {
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            match fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    first_error.get_or_insert(e.into());
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
