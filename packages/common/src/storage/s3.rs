use std::path::Path;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tokio::fs;
use tracing::info;

use super::error::StorageError;
use super::traits::{BlobStore, StoredObject};

/// Connection settings for the S3 backend.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    /// Falls back to ambient credentials (env/profile) when unset.
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Base of public URLs; defaults to `{endpoint}/{bucket}`.
    pub public_base_url: Option<String>,
}

/// S3-compatible blob store over a single shared bucket.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    public_base: String,
}

impl S3BlobStore {
    /// Connect to the bucket, creating it when it does not exist yet.
    pub async fn connect(settings: &S3Settings) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: settings.region.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        };

        let credentials = match (&settings.access_key, &settings.secret_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access), Some(secret), None, None, None)
            }
            _ => Credentials::default(),
        }
        .map_err(|e| StorageError::Backend(format!("credentials: {e}")))?;

        let bucket = Bucket::new(&settings.bucket, region.clone(), credentials.clone())
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        let exists = bucket
            .exists()
            .await
            .map_err(|e| StorageError::Backend(format!("bucket probe failed: {e}")))?;
        if !exists {
            Bucket::create_with_path_style(
                &settings.bucket,
                region,
                credentials,
                BucketConfiguration::default(),
            )
            .await
            .map_err(|e| StorageError::Backend(format!("bucket create failed: {e}")))?;
            info!(bucket = %settings.bucket, "Created storage bucket");
        }

        let public_base = settings
            .public_base_url
            .clone()
            .unwrap_or_else(|| {
                format!(
                    "{}/{}",
                    settings.endpoint.trim_end_matches('/'),
                    settings.bucket
                )
            })
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bucket,
            public_base,
        })
    }

    fn public_url(&self, dest_path: &str) -> String {
        format!("{}/{}", self.public_base, dest_path)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_file(
        &self,
        local_path: &Path,
        dest_path: &str,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        // No conditional put in the backend; a head probe is enough since
        // destination paths are timestamp-namespaced.
        if let Ok((_, code)) = self.bucket.head_object(dest_path).await
            && (200..300).contains(&code)
        {
            return Err(StorageError::AlreadyExists(dest_path.to_string()));
        }

        let data = fs::read(local_path).await?;

        let response = self
            .bucket
            .put_object_with_content_type(dest_path, &data, content_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if response.status_code() != 200 {
            return Err(StorageError::Backend(format!(
                "upload of {dest_path} failed with status {}",
                response.status_code()
            )));
        }

        Ok(StoredObject {
            path: dest_path.to_string(),
            public_url: self.public_url(dest_path),
        })
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        let mut first_error = None;

        for path in paths {
            if let Err(e) = self.bucket.delete_object(path).await {
                first_error.get_or_insert(StorageError::Backend(format!(
                    "delete of {path} failed: {e}"
                )));
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
