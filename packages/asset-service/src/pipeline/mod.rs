//! Streaming pipelines behind the asset calls.
//!
//! Upload and update share the framed protocol: one metadata frame, then
//! chunk frames until the client closes its side.

pub mod delete;
pub mod download;
pub mod listing;
pub(crate) mod scratch;
pub mod update;
pub mod upload;

use common::storage::{BlobKey, BlobStore};
use futures::{Stream, StreamExt};
use tracing::warn;

use crate::error::{AppError, Status};
use crate::models::asset::ChunkFrame;
use crate::state::AppState;
use crate::utils::filename::validate_flat_filename;

use self::scratch::{ScratchBuffer, StagedBlob};

/// Pull the leading metadata frame off an inbound stream.
pub(crate) async fn receive_metadata<S, F>(frames: &mut S) -> Result<F::Metadata, AppError>
where
    S: Stream<Item = Result<F, Status>> + Unpin,
    F: ChunkFrame,
{
    match frames.next().await {
        Some(Ok(frame)) => match frame.into_parts() {
            Err(meta) => Ok(meta),
            Ok(_) => Err(AppError::InvalidArgument(
                "First request must contain metadata".into(),
            )),
        },
        Some(Err(status)) => Err(AppError::Cancelled(status.message)),
        None => Err(AppError::InvalidArgument(
            "First request must contain metadata".into(),
        )),
    }
}

/// Check the announced filename and size before any byte is accepted.
///
/// Returns the trimmed filename and the size as an unsigned count.
pub(crate) fn validate_header<'a>(
    state: &AppState,
    filename: &'a str,
    size: i64,
) -> Result<(&'a str, u64), AppError> {
    let filename = validate_flat_filename(filename)?;

    if size <= 0 {
        return Err(AppError::InvalidArgument(
            "File size must be greater than zero".into(),
        ));
    }
    let size = size as u64;
    let limit = state.config.storage.max_blob_size;
    if size > limit {
        return Err(AppError::InvalidArgument(format!(
            "File exceeds maximum size of {limit} bytes"
        )));
    }

    Ok((filename, size))
}

/// Receive every remaining chunk into a fresh scratch file.
///
/// The staged blob holds exactly `declared` bytes; anything else is rejected.
pub(crate) async fn receive_chunks<S, F>(
    state: &AppState,
    frames: &mut S,
    declared: u64,
) -> Result<StagedBlob, AppError>
where
    S: Stream<Item = Result<F, Status>> + Unpin,
    F: ChunkFrame,
{
    let storage = &state.config.storage;
    let mut scratch = ScratchBuffer::create(&storage.scratch_dir, storage.max_blob_size).await?;

    while let Some(frame) = frames.next().await {
        let frame = frame.map_err(|status| AppError::Cancelled(status.message))?;
        let chunk = frame.into_parts().map_err(|_| {
            AppError::InvalidArgument("Subsequent requests must contain chunk data".into())
        })?;
        scratch.append(&chunk).await?;
    }

    if scratch.len() != declared {
        return Err(AppError::InvalidArgument(format!(
            "Declared size {declared} does not match {} bytes received",
            scratch.len()
        )));
    }

    scratch.stage().await
}

/// Write a staged blob under `key`.
pub(crate) async fn commit_blob(
    store: &dyn BlobStore,
    key: &BlobKey,
    staged: &StagedBlob,
) -> Result<(), AppError> {
    let reader = staged.reader().await?;
    store.put_stream(key, reader, staged.len()).await?;
    Ok(())
}

/// Remove a blob whose metadata row could not be written. Failures are only logged.
pub(crate) async fn discard_blob(store: &dyn BlobStore, key: &BlobKey) {
    if let Err(e) = store.remove(key).await {
        warn!(key = %key, error = %e, "Failed to remove orphaned blob");
    }
}
