//! Minimal entity store: the owning rows that assets hang off.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use super::EntityKind;
use crate::entity::{article, asset, lab, submission};
use crate::error::AppError;
use crate::models::entity::{EntityRecord, NewArticle, NewLab, NewSubmission};

pub async fn create_lab<C: ConnectionTrait>(db: &C, new: NewLab) -> Result<lab::Model, AppError> {
    validate_title(&new.title)?;
    let now = Utc::now();
    let model = lab::ActiveModel {
        owner_id: Set(new.owner_id),
        title: Set(new.title.trim().to_string()),
        summary: Set(new.summary),
        views: Set(0),
        submissions: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

pub async fn create_article<C: ConnectionTrait>(
    db: &C,
    new: NewArticle,
) -> Result<article::Model, AppError> {
    validate_title(&new.title)?;
    let now = Utc::now();
    let model = article::ActiveModel {
        owner_id: Set(new.owner_id),
        title: Set(new.title.trim().to_string()),
        summary: Set(new.summary),
        views: Set(0),
        stars: Set(0),
        people_rated: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

pub async fn create_submission<C: ConnectionTrait>(
    db: &C,
    new: NewSubmission,
) -> Result<submission::Model, AppError> {
    find_entity(db, EntityKind::Lab, new.lab_id).await?;
    let now = Utc::now();
    let model = submission::ActiveModel {
        lab_id: Set(new.lab_id),
        owner_id: Set(new.owner_id),
        status: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

/// Look up an owning row, `NotFound` if absent.
pub async fn find_entity<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    id: i64,
) -> Result<EntityRecord, AppError> {
    let record = match kind {
        EntityKind::Lab => lab::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(EntityRecord::Lab),
        EntityKind::Article => article::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(EntityRecord::Article),
        EntityKind::Submission => submission::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(EntityRecord::Submission),
    };

    record.ok_or_else(|| AppError::NotFound(format!("{} with id '{id}' not found", kind.name())))
}

/// Every asset that disappears with the entity, as `(owner kind, row)` pairs.
///
/// Deleting a lab also deletes its submissions, so their assets are included.
pub async fn owned_assets<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    id: i64,
) -> Result<Vec<(EntityKind, asset::Model)>, AppError> {
    let mut owned: Vec<(EntityKind, asset::Model)> = super::metadata::assets_of(db, kind, id)
        .await?
        .into_iter()
        .map(|row| (kind, row))
        .collect();

    if kind == EntityKind::Lab {
        let submission_ids: Vec<i64> = submission::Entity::find()
            .filter(submission::Column::LabId.eq(id))
            .all(db)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if !submission_ids.is_empty() {
            let nested = asset::Entity::find()
                .filter(asset::Column::SubmissionId.is_in(submission_ids))
                .all(db)
                .await?;
            owned.extend(nested.into_iter().map(|row| (EntityKind::Submission, row)));
        }
    }

    Ok(owned)
}

/// Delete the owning row together with its assets (and a lab's submissions).
///
/// Dependents are deleted first, in the same order the foreign-key cascades
/// would remove them. Run inside a transaction.
pub async fn delete_entity_row<C: ConnectionTrait>(
    db: &C,
    kind: EntityKind,
    id: i64,
) -> Result<(), AppError> {
    asset::Entity::delete_many()
        .filter(kind.parent_column().eq(id))
        .exec(db)
        .await?;

    if kind == EntityKind::Lab {
        let submission_ids: Vec<i64> = submission::Entity::find()
            .filter(submission::Column::LabId.eq(id))
            .all(db)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if !submission_ids.is_empty() {
            asset::Entity::delete_many()
                .filter(asset::Column::SubmissionId.is_in(submission_ids))
                .exec(db)
                .await?;
            submission::Entity::delete_many()
                .filter(submission::Column::LabId.eq(id))
                .exec(db)
                .await?;
        }
    }

    let result = match kind {
        EntityKind::Lab => lab::Entity::delete_by_id(id).exec(db).await?,
        EntityKind::Article => article::Entity::delete_by_id(id).exec(db).await?,
        EntityKind::Submission => submission::Entity::delete_by_id(id).exec(db).await?,
    };

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "{} with id '{id}' not found",
            kind.name()
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 255 {
        return Err(AppError::InvalidArgument(
            "Title must be 1-255 characters".into(),
        ));
    }
    Ok(())
}
