use common::storage::BlobKey;
use sea_orm::TransactionTrait;
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::asset::DeleteAssetResponse;
use crate::models::entity::DeleteEntityResponse;
use crate::state::AppState;
use crate::store::EntityKind;
use crate::store::entity::{delete_entity_row, find_entity, owned_assets};
use crate::store::metadata::{delete_asset_row, find_asset};

/// Delete one asset: blob first, then its row.
///
/// If the blob cannot be removed the row is kept and the call fails, so the
/// asset stays findable and the delete can be retried.
#[instrument(skip(state), fields(kind = kind.name()))]
pub async fn delete_asset(
    state: &AppState,
    kind: EntityKind,
    asset_id: i64,
) -> Result<DeleteAssetResponse, AppError> {
    let row = find_asset(&state.db, kind, asset_id).await?;
    let parent_id = kind
        .parent_of(&row)
        .ok_or_else(|| AppError::Internal(format!("asset {asset_id} has no parent")))?;
    let key = BlobKey::for_asset(kind.bucket(), parent_id, &row.filename)?;

    match state.blob_store.remove(&key).await {
        Ok(true) => {}
        Ok(false) => warn!(key = %key, "Blob was already gone, deleting row anyway"),
        Err(e) => {
            return Err(AppError::Internal(format!(
                "Failed to remove blob {key}: {e}"
            )));
        }
    }

    delete_asset_row(&state.db, row.id).await?;
    info!("Asset deleted");
    Ok(DeleteAssetResponse { success: true })
}

/// Delete a lab, article or submission with everything it owns.
///
/// Blob removal is best-effort: keys that could not be removed are returned
/// and do not stop the rows from being deleted.
#[instrument(skip(state), fields(kind = kind.name()))]
pub async fn delete_entity(
    state: &AppState,
    kind: EntityKind,
    id: i64,
) -> Result<DeleteEntityResponse, AppError> {
    find_entity(&state.db, kind, id).await?;
    let owned = owned_assets(&state.db, kind, id).await?;

    let mut unremoved_blobs = Vec::new();
    for (owner, row) in &owned {
        let Some(parent_id) = owner.parent_of(row) else {
            continue;
        };
        let key = match BlobKey::for_asset(owner.bucket(), parent_id, &row.filename) {
            Ok(key) => key,
            Err(e) => {
                warn!(asset_id = row.id, error = %e, "Asset has no valid blob key");
                unremoved_blobs.push(format!("{}/{parent_id}/{}", owner.bucket(), row.filename));
                continue;
            }
        };
        if let Err(e) = state.blob_store.remove(&key).await {
            warn!(key = %key, error = %e, "Failed to remove blob");
            unremoved_blobs.push(key.to_string());
        }
    }

    let txn = state.db.begin().await?;
    delete_entity_row(&txn, kind, id).await?;
    txn.commit().await?;

    info!(
        assets = owned.len(),
        unremoved = unremoved_blobs.len(),
        "Entity deleted"
    );
    Ok(DeleteEntityResponse {
        success: true,
        unremoved_blobs,
    })
}
