use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::key::BlobKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// One entry returned by [`BlobStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub key: BlobKey,
    pub size: u64,
}

/// Key-addressed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the bucket if it does not exist yet. Called once at start-up.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Store bytes under `key`, replacing any previous object.
    async fn put(&self, key: &BlobKey, data: &[u8]) -> Result<(), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(key, reader, data.len() as u64).await
    }

    /// Store exactly `size` bytes read from `reader` under `key`.
    ///
    /// Fails with [`StorageError::SizeMismatch`] if the reader yields a
    /// different number of bytes; nothing is left behind in that case.
    async fn put_stream(
        &self,
        key: &BlobKey,
        reader: BoxReader,
        size: u64,
    ) -> Result<(), StorageError>;

    /// Retrieve all bytes of an object.
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open an object as a streaming async reader.
    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Remove an object.
    ///
    /// Returns `true` if the object was removed, `false` if it did not exist.
    async fn remove(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// List every object in `bucket` whose path starts with `prefix`, sorted by path.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, StorageError>;
}
