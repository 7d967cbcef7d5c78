//! Per-call staging of inbound chunks on local disk.
//!
//! Both types own a [`TempPath`], so the file is removed whenever the value
//! is dropped: normal return, early error, or a cancelled call future.

use std::path::Path;

use common::storage::BoxReader;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;

/// Chunks received so far for one call.
pub(crate) struct ScratchBuffer {
    file: tokio::fs::File,
    path: TempPath,
    len: u64,
    limit: u64,
}

impl ScratchBuffer {
    /// Create an empty scratch file under `dir`, accepting at most `limit` bytes.
    pub async fn create(dir: &Path, limit: u64) -> Result<Self, AppError> {
        let dir = dir.to_path_buf();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("asset-upload-")
                .tempfile_in(dir)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Scratch task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Failed to create scratch file: {e}")))?;
        let (file, path) = named.into_parts();

        Ok(Self {
            file: tokio::fs::File::from_std(file),
            path,
            len: 0,
            limit,
        })
    }

    pub async fn append(&mut self, chunk: &[u8]) -> Result<(), AppError> {
        let len = self.len + chunk.len() as u64;
        if len > self.limit {
            return Err(AppError::InvalidArgument(format!(
                "File exceeds maximum size of {} bytes",
                self.limit
            )));
        }

        self.file
            .write_all(chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Scratch write failed: {e}")))?;
        self.len = len;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// Flush everything to disk; no more chunks can be added afterwards.
    pub async fn stage(mut self) -> Result<StagedBlob, AppError> {
        self.file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Scratch flush failed: {e}")))?;
        drop(self.file);

        Ok(StagedBlob {
            path: self.path,
            len: self.len,
        })
    }
}

/// A complete upload waiting to be committed to the blob store.
pub(crate) struct StagedBlob {
    path: TempPath,
    len: u64,
}

impl StagedBlob {
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Open the staged bytes for reading. The file stays until `self` is dropped.
    pub async fn reader(&self) -> Result<BoxReader, AppError> {
        let file = tokio::fs::File::open(&*self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen scratch file: {e}")))?;
        Ok(Box::new(file))
    }
}
