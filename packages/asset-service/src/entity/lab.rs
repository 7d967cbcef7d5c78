use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lab")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub owner_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub summary: Option<String>,

    pub views: i64,
    /// Number of submissions received.
    pub submissions: i64,

    #[sea_orm(has_many)]
    pub lab_submissions: HasMany<super::submission::Entity>,

    #[sea_orm(has_many)]
    pub assets: HasMany<super::asset::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
