use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use super::EntityKind;
use super::entity::find_entity;
use crate::entity::asset;
use crate::error::AppError;

/// Fetch an asset row owned by `kind`.
///
/// A row that exists but belongs to another kind is reported as missing.
pub async fn find_asset<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    asset_id: i64,
) -> Result<asset::Model, AppError> {
    asset::Entity::find_by_id(asset_id)
        .filter(kind.parent_column().is_not_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset with id '{asset_id}' not found")))
}

/// Whether another asset of the same parent already uses `filename`.
pub async fn filename_taken<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    parent_id: i64,
    filename: &str,
    except_asset: Option<i64>,
) -> Result<bool, AppError> {
    let mut select = asset::Entity::find()
        .filter(kind.parent_column().eq(parent_id))
        .filter(asset::Column::Filename.eq(filename));
    if let Some(id) = except_asset {
        select = select.filter(asset::Column::Id.ne(id));
    }
    Ok(select.count(db).await? > 0)
}

/// Create an asset row in its own transaction.
///
/// The parent is looked up again inside the transaction; the foreign key
/// catches a parent deleted between that check and the commit.
pub async fn insert_asset(
    db: &DatabaseConnection,
    kind: EntityKind,
    parent_id: i64,
    filename: &str,
    filesize: i64,
) -> Result<asset::Model, AppError> {
    let txn = db.begin().await?;
    find_entity(&txn, kind, parent_id).await?;

    let mut active = asset::ActiveModel {
        filename: Set(filename.to_string()),
        filesize: Set(filesize),
        upload_date: Set(Utc::now()),
        ..Default::default()
    };
    kind.set_parent(&mut active, parent_id);

    let model = active.insert(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

/// Replace filename and size of an existing asset in one transaction.
pub async fn update_asset(
    db: &DatabaseConnection,
    kind: EntityKind,
    asset_id: i64,
    filename: &str,
    filesize: i64,
) -> Result<asset::Model, AppError> {
    let txn = db.begin().await?;
    let existing = find_asset(&txn, kind, asset_id).await?;

    let mut active: asset::ActiveModel = existing.into();
    active.filename = Set(filename.to_string());
    active.filesize = Set(filesize);
    active.upload_date = Set(Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

pub async fn delete_asset_row<C: ConnectionTrait>(db: &C, asset_id: i64) -> Result<(), AppError> {
    let result = asset::Entity::delete_by_id(asset_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "Asset with id '{asset_id}' not found"
        )));
    }
    Ok(())
}

/// All assets owned directly by one parent, ascending by id.
pub async fn assets_of<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    parent_id: i64,
) -> Result<Vec<asset::Model>, AppError> {
    Ok(asset::Entity::find()
        .filter(kind.parent_column().eq(parent_id))
        .order_by_asc(asset::Column::Id)
        .all(db)
        .await?)
}

/// One page of a parent's assets plus the parent's total asset count.
///
/// `page` is 1-based; both arguments are expected to be at least 1. A page
/// that starts past the last asset is empty, however large the bounds.
pub async fn page_assets<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    parent_id: i64,
    page: u64,
    page_size: u64,
) -> Result<(u64, Vec<asset::Model>), AppError> {
    let select = asset::Entity::find().filter(kind.parent_column().eq(parent_id));
    let total = select.clone().count(db).await?;

    let Some(offset) = (page - 1).checked_mul(page_size).filter(|o| *o < total) else {
        return Ok((total, Vec::new()));
    };
    // Both stay below `total`, so they fit the database's signed integers.
    let limit = page_size.min(total - offset);

    let rows = select
        .order_by_asc(asset::Column::Id)
        .offset(Some(offset))
        .limit(Some(limit))
        .all(db)
        .await?;
    Ok((total, rows))
}
