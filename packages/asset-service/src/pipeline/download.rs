use std::pin::Pin;

use bytes::Bytes;
use common::storage::{BlobKey, BoxReader, StorageError};
use futures::Stream;
use tokio::io::AsyncReadExt;
use tokio::sync::{OwnedSemaphorePermit, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, debug, info, instrument};

use crate::error::{AppError, Status};
use crate::models::asset::{Asset, DownloadFrame};
use crate::state::AppState;
use crate::store::EntityKind;
use crate::store::metadata::find_asset;

/// Server-streamed frames of one download.
pub type DownloadStream = Pin<Box<dyn Stream<Item = Result<DownloadFrame, Status>> + Send>>;

/// Resolve an asset and stream it back: the record first, then its content.
///
/// Both the row and the blob are opened before the stream is returned, so
/// `NotFound` and `DataLoss` surface as call errors. The producer task owns
/// `permit` and keeps its worker slot until the last frame is sent or the
/// caller drops the stream.
#[instrument(skip(state, permit), fields(kind = kind.name()))]
pub async fn download_asset(
    state: &AppState,
    kind: EntityKind,
    asset_id: i64,
    permit: OwnedSemaphorePermit,
) -> Result<DownloadStream, AppError> {
    let row = find_asset(&state.db, kind, asset_id).await?;
    let asset = Asset::from_model(kind, row)
        .ok_or_else(|| AppError::Internal(format!("asset {asset_id} has no parent")))?;
    let key = BlobKey::for_asset(kind.bucket(), asset.parent_id, &asset.filename)?;

    let reader = state.blob_store.get_stream(&key).await.map_err(|e| match e {
        StorageError::NotFound(_) => {
            AppError::MissingBlob(format!("asset {asset_id} has no blob at {key}"))
        }
        other => AppError::Internal(format!("Failed to open blob {key}: {other}")),
    })?;

    let chunk_size = state.config.storage.download_chunk_size.max(1);
    let (tx, rx) = mpsc::channel(state.config.rpc.download_buffer.max(1));

    tokio::spawn(
        async move {
            let _permit = permit;
            let filesize = asset.filesize;
            if tx.send(Ok(DownloadFrame::Asset(asset))).await.is_err() {
                debug!("Receiver dropped before the first frame");
                return;
            }

            match send_chunks(reader, chunk_size, &tx).await {
                Ok(true) => info!(filesize, "Asset downloaded"),
                Ok(false) => debug!("Receiver dropped mid-stream"),
                Err(e) => {
                    let _ = tx.send(Err(e.into_status())).await;
                }
            }
        }
        .in_current_span(),
    );

    Ok(Box::pin(ReceiverStream::new(rx)))
}

/// Forward the blob as fixed-size chunks; only the last may be shorter.
///
/// Returns `false` if the receiver went away first.
async fn send_chunks(
    mut reader: BoxReader,
    chunk_size: usize,
    tx: &mpsc::Sender<Result<DownloadFrame, Status>>,
) -> Result<bool, AppError> {
    loop {
        let mut chunk = vec![0u8; chunk_size];
        let n = fill(&mut reader, &mut chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Blob read failed: {e}")))?;
        if n == 0 {
            return Ok(true);
        }
        chunk.truncate(n);

        if tx
            .send(Ok(DownloadFrame::Chunk(Bytes::from(chunk))))
            .await
            .is_err()
        {
            return Ok(false);
        }
        if n < chunk_size {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
async fn fill(reader: &mut BoxReader, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
