use async_trait::async_trait;
use futures::TryStreamExt;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tokio_util::io::StreamReader;
use tracing::info;

use super::error::StorageError;
use super::key::{BlobKey, validate_bucket};
use super::traits::{BlobInfo, BlobStore, BoxReader};
use crate::config::S3Config;

/// Blob store backed by an S3-compatible service (MinIO in development).
///
/// Each [`BlobKey`] bucket maps to a real S3 bucket and the key path is the
/// object name.
pub struct S3BlobStore {
    region: Region,
    credentials: Credentials,
    path_style: bool,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(config: &S3Config, max_size: u64) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid S3 credentials: {e}")))?;

        Ok(Self {
            region: Region::Custom {
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
            },
            credentials,
            path_style: config.path_style,
            max_size,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())?;
        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

fn check_status(status: u16, key: &BlobKey) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for {key}"
        ))),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        validate_bucket(bucket)?;
        if self.bucket(bucket)?.exists().await? {
            return Ok(());
        }

        let config = BucketConfiguration::default();
        let response = if self.path_style {
            Bucket::create_with_path_style(
                bucket,
                self.region.clone(),
                self.credentials.clone(),
                config,
            )
            .await?
        } else {
            Bucket::create(bucket, self.region.clone(), self.credentials.clone(), config).await?
        };

        if !response.success() {
            return Err(StorageError::Backend(format!(
                "failed to create bucket {bucket}: {} {}",
                response.response_code, response.response_text
            )));
        }

        info!(bucket, "Created bucket");
        Ok(())
    }

    async fn put_stream(
        &self,
        key: &BlobKey,
        mut reader: BoxReader,
        size: u64,
    ) -> Result<(), StorageError> {
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let bucket = self.bucket(key.bucket())?;
        let response = bucket.put_object_stream(&mut reader, key.path()).await?;
        check_status(response.status_code(), key)?;

        let uploaded = response.uploaded_bytes() as u64;
        if uploaded != size {
            // The short object already replaced whatever was there; do not keep it.
            let _ = bucket.delete_object(key.path()).await;
            return Err(StorageError::SizeMismatch {
                expected: size,
                actual: uploaded,
            });
        }

        Ok(())
    }

    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError> {
        let response = self
            .bucket(key.bucket())?
            .get_object_stream(key.path())
            .await?;
        check_status(response.status_code, key)?;

        let stream = response
            .bytes
            .map_err(|e| std::io::Error::other(e.to_string()));
        Ok(Box::new(StreamReader::new(stream)))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let (_, status) = self.bucket(key.bucket())?.head_object(key.path()).await?;
        match check_status(status, key) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, key: &BlobKey) -> Result<bool, StorageError> {
        // S3 deletes are idempotent and do not report whether the object existed.
        let existed = self.exists(key).await?;
        if !existed {
            return Ok(false);
        }

        let response = self
            .bucket(key.bucket())?
            .delete_object(key.path())
            .await?;
        check_status(response.status_code(), key)?;
        Ok(true)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, StorageError> {
        let pages = self.bucket(bucket)?.list(prefix.to_string(), None).await?;

        let mut found = Vec::new();
        for page in pages {
            for object in page.contents {
                found.push(BlobInfo {
                    key: BlobKey::new(bucket, object.key)?,
                    size: object.size,
                });
            }
        }

        found.sort_by(|a, b| a.key.path().cmp(b.key.path()));
        Ok(found)
    }
}
