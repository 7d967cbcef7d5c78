use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata of one uploaded file.
///
/// Exactly one of the three parent columns is set; each carries its own
/// `ON DELETE CASCADE` foreign key so removing a parent drops its assets in
/// the same statement.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub lab_id: Option<i64>,
    #[sea_orm(belongs_to, from = "lab_id", to = "id", on_delete = "Cascade")]
    pub lab: HasOne<super::lab::Entity>,

    pub article_id: Option<i64>,
    #[sea_orm(belongs_to, from = "article_id", to = "id", on_delete = "Cascade")]
    pub article: HasOne<super::article::Entity>,

    pub submission_id: Option<i64>,
    #[sea_orm(belongs_to, from = "submission_id", to = "id", on_delete = "Cascade")]
    pub submission: HasOne<super::submission::Entity>,

    /// Flat filename; also the last segment of the blob key.
    pub filename: String,

    /// Size in bytes, always equal to the stored blob's size.
    pub filesize: i64,

    pub upload_date: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
