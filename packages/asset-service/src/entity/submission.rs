use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub lab_id: i64,
    #[sea_orm(belongs_to, from = "lab_id", to = "id", on_delete = "Cascade")]
    pub lab: HasOne<super::lab::Entity>,

    pub owner_id: i64,
    /// Review status; 0 means not yet graded.
    pub status: i32,

    #[sea_orm(has_many)]
    pub assets: HasMany<super::asset::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
