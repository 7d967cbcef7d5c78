use common::storage::BlobKey;
use futures::Stream;
use tracing::{Span, info, instrument, warn};

use super::{commit_blob, discard_blob, receive_chunks, receive_metadata, validate_header};
use crate::error::{AppError, Status};
use crate::models::asset::{Asset, UpdateFrame, UpdateMetadata};
use crate::state::AppState;
use crate::store::EntityKind;
use crate::store::metadata::{filename_taken, find_asset, update_asset as update_row};

/// Replace the content, filename and size of an existing asset.
///
/// The old blob is removed before any chunk is read. A call that fails
/// after that point leaves the row pointing at no blob; downloads then
/// report data loss until the asset is updated again or deleted.
#[instrument(skip(state, frames), fields(kind = kind.name(), asset_id, filename))]
pub async fn update_asset<S>(
    state: &AppState,
    kind: EntityKind,
    mut frames: S,
) -> Result<Asset, AppError>
where
    S: Stream<Item = Result<UpdateFrame, Status>> + Unpin,
{
    let meta: UpdateMetadata = receive_metadata(&mut frames).await?;
    let span = Span::current();
    span.record("asset_id", meta.asset_id);
    span.record("filename", meta.filename.as_str());

    let existing = find_asset(&state.db, kind, meta.asset_id).await?;
    let parent_id = kind
        .parent_of(&existing)
        .ok_or_else(|| AppError::Internal(format!("asset {} has no parent", existing.id)))?;

    let (filename, size) = validate_header(state, &meta.filename, meta.size)?;
    if filename_taken(&state.db, kind, parent_id, filename, Some(existing.id)).await? {
        return Err(AppError::Conflict(format!(
            "{} '{parent_id}' already has an asset named '{filename}'",
            kind.name()
        )));
    }

    let old_key = BlobKey::for_asset(kind.bucket(), parent_id, &existing.filename)?;
    let new_key = BlobKey::for_asset(kind.bucket(), parent_id, filename)?;

    match state.blob_store.remove(&old_key).await {
        Ok(true) => {}
        Ok(false) => warn!(key = %old_key, "Previous blob was already gone"),
        Err(e) => {
            return Err(AppError::Internal(format!(
                "Failed to remove previous blob {old_key}: {e}"
            )));
        }
    }

    let staged = receive_chunks(state, &mut frames, size).await?;
    commit_blob(state.blob_store.as_ref(), &new_key, &staged).await?;
    drop(staged);

    let row = match update_row(&state.db, kind, existing.id, filename, meta.size).await {
        Ok(row) => row,
        Err(e) => {
            discard_blob(state.blob_store.as_ref(), &new_key).await;
            return Err(AppError::Internal(format!("Failed to record asset: {e}")));
        }
    };

    info!(size, "Asset updated");
    Asset::from_model(kind, row)
        .ok_or_else(|| AppError::Internal("updated asset has no parent".into()))
}
