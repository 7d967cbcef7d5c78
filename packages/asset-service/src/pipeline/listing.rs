use tracing::instrument;

use crate::error::AppError;
use crate::models::asset::{Asset, AssetList, ListAssetsRequest};
use crate::state::AppState;
use crate::store::EntityKind;
use crate::store::entity::find_entity;
use crate::store::metadata::{find_asset, page_assets};

/// One page of a parent's assets, ascending by id.
#[instrument(skip(state), fields(kind = kind.name()))]
pub async fn list_assets(
    state: &AppState,
    kind: EntityKind,
    req: ListAssetsRequest,
) -> Result<AssetList, AppError> {
    let (page, page_size) = page_bounds(&req)?;
    find_entity(&state.db, kind, req.parent_id).await?;

    let (total_count, rows) = page_assets(&state.db, kind, req.parent_id, page, page_size).await?;
    let assets = rows
        .into_iter()
        .filter_map(|row| Asset::from_model(kind, row))
        .collect();

    Ok(AssetList {
        total_count,
        assets,
    })
}

/// Fetch a single asset record without its content.
#[instrument(skip(state), fields(kind = kind.name()))]
pub async fn get_asset(state: &AppState, kind: EntityKind, asset_id: i64) -> Result<Asset, AppError> {
    let row = find_asset(&state.db, kind, asset_id).await?;
    Asset::from_model(kind, row)
        .ok_or_else(|| AppError::Internal(format!("asset {asset_id} has no parent")))
}

fn page_bounds(req: &ListAssetsRequest) -> Result<(u64, u64), AppError> {
    if req.page_number < 1 {
        return Err(AppError::InvalidArgument(
            "page_number must be at least 1".into(),
        ));
    }
    if req.page_size < 1 {
        return Err(AppError::InvalidArgument(
            "page_size must be at least 1".into(),
        ));
    }
    Ok((req.page_number as u64, req.page_size as u64))
}
