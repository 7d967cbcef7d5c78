use common::storage::BlobKey;
use futures::Stream;
use tracing::{Span, info, instrument};

use super::{commit_blob, discard_blob, receive_chunks, receive_metadata, validate_header};
use crate::error::{AppError, Status};
use crate::models::asset::{Asset, UploadFrame, UploadMetadata};
use crate::state::AppState;
use crate::store::EntityKind;
use crate::store::entity::find_entity;
use crate::store::metadata::{filename_taken, insert_asset};

/// Receive a new asset for a parent and commit it.
///
/// The blob is written before the row; if the row cannot be created the
/// blob is removed again, so a failed upload leaves neither behind.
#[instrument(skip(state, frames), fields(kind = kind.name(), parent_id, filename))]
pub async fn upload_asset<S>(
    state: &AppState,
    kind: EntityKind,
    mut frames: S,
) -> Result<Asset, AppError>
where
    S: Stream<Item = Result<UploadFrame, Status>> + Unpin,
{
    let meta: UploadMetadata = receive_metadata(&mut frames).await?;
    let span = Span::current();
    span.record("parent_id", meta.parent_id);
    span.record("filename", meta.filename.as_str());

    let (filename, size) = validate_header(state, &meta.filename, meta.size)?;
    find_entity(&state.db, kind, meta.parent_id).await?;
    if filename_taken(&state.db, kind, meta.parent_id, filename, None).await? {
        return Err(AppError::Conflict(format!(
            "{} '{}' already has an asset named '{filename}'",
            kind.name(),
            meta.parent_id
        )));
    }
    let key = BlobKey::for_asset(kind.bucket(), meta.parent_id, filename)?;

    let staged = receive_chunks(state, &mut frames, size).await?;
    commit_blob(state.blob_store.as_ref(), &key, &staged).await?;
    drop(staged);

    let row = match insert_asset(&state.db, kind, meta.parent_id, filename, meta.size).await {
        Ok(row) => row,
        Err(e) => {
            discard_blob(state.blob_store.as_ref(), &key).await;
            return Err(AppError::Internal(format!("Failed to record asset: {e}")));
        }
    };

    info!(asset_id = row.id, size, "Asset uploaded");
    Asset::from_model(kind, row)
        .ok_or_else(|| AppError::Internal("inserted asset has no parent".into()))
}
