use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::key::{BlobKey, validate_bucket};
use super::traits::{BlobInfo, BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Objects live at `{base_path}/{bucket}/{path}`; writes go through
/// `{base_path}/.tmp` and are renamed into place once complete.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.base_path.join(bucket)
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        key.path()
            .split('/')
            .fold(self.bucket_path(key.bucket()), |acc, segment| acc.join(segment))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn require_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if fs::try_exists(self.bucket_path(bucket)).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("bucket {bucket}")))
        }
    }

    /// Copy `reader` into `temp_path`, returning the number of bytes written.
    async fn spool(&self, mut reader: BoxReader, temp_path: &Path) -> Result<u64, StorageError> {
        let mut temp_file = fs::File::create(temp_path).await?;
        let mut total_bytes: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(total_bytes)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        validate_bucket(bucket)?;
        fs::create_dir_all(self.bucket_path(bucket)).await?;
        Ok(())
    }

    async fn put_stream(
        &self,
        key: &BlobKey,
        reader: BoxReader,
        size: u64,
    ) -> Result<(), StorageError> {
        self.require_bucket(key.bucket()).await?;

        let temp_path = self.temp_path();
        let written = match self.spool(reader, &temp_path).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        if written != size {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::SizeMismatch {
                expected: size,
                actual: written,
            });
        }

        let blob_path = self.blob_path(key);
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.blob_path(key)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(key)).await?)
    }

    async fn remove(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(key);
        // Per-parent directories are left in place: a concurrent put may be
        // about to rename into one.
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, StorageError> {
        self.require_bucket(bucket).await?;

        let root = self.bucket_path(bucket);
        let mut pending = vec![root.clone()];
        let mut found = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                    continue;
                }

                let entry_path = entry.path();
                let Ok(relative) = entry_path.strip_prefix(&root) else {
                    continue;
                };
                let path = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if path.starts_with(prefix) {
                    let size = entry.metadata().await?.len();
                    found.push(BlobInfo {
                        key: BlobKey::new(bucket, path)?,
                        size,
                    });
                }
            }
        }

        found.sort_by(|a, b| a.key.path().cmp(b.key.path()));
        Ok(found)
    }
}
