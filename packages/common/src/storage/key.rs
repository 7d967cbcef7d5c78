use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Address of one object: a bucket plus a `/`-separated path inside it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobKey {
    bucket: String,
    path: String,
}

impl BlobKey {
    /// Build a key, rejecting anything that could escape the bucket.
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Result<Self, StorageError> {
        let bucket = bucket.into();
        let path = path.into();

        validate_bucket(&bucket)?;

        if path.is_empty() {
            return Err(StorageError::InvalidKey("path cannot be empty".into()));
        }
        if path.contains('\0') || path.contains('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path contains forbidden characters: {path:?}"
            )));
        }
        for segment in path.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StorageError::InvalidKey(format!(
                    "path has an empty or relative segment: {path:?}"
                )));
            }
        }

        Ok(Self { bucket, path })
    }

    /// Derive the key of an asset: `{bucket}/{parent_id}/{filename}`.
    pub fn for_asset(bucket: &str, parent_id: i64, filename: &str) -> Result<Self, StorageError> {
        Self::new(bucket, format!("{parent_id}/{filename}"))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object path inside the bucket.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Bucket names follow the S3 rules closely enough for MinIO and the filesystem.
pub fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
    let valid_len = (3..=63).contains(&bucket.len());
    let valid_chars = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    let valid_edges = !bucket.starts_with(['-', '.']) && !bucket.ends_with(['-', '.']);

    if valid_len && valid_chars && valid_edges {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(format!(
            "invalid bucket name: {bucket:?}"
        )))
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({self})")
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}
