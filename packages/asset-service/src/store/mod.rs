//! Metadata store adapter: entity and asset rows in the relational database.

pub mod entity;
pub mod metadata;

use sea_orm::ActiveValue::Set;

use crate::entity::asset;

/// The three kinds of entity that own assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Lab,
    Article,
    Submission,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Lab, EntityKind::Article, EntityKind::Submission];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Lab => "Lab",
            EntityKind::Article => "Article",
            EntityKind::Submission => "Submission",
        }
    }

    /// Bucket holding this kind's blobs.
    pub fn bucket(&self) -> &'static str {
        match self {
            EntityKind::Lab => "labs",
            EntityKind::Article => "articles",
            EntityKind::Submission => "submissions",
        }
    }

    /// Foreign-key column of `asset` pointing at this kind.
    pub fn parent_column(&self) -> asset::Column {
        match self {
            EntityKind::Lab => asset::Column::LabId,
            EntityKind::Article => asset::Column::ArticleId,
            EntityKind::Submission => asset::Column::SubmissionId,
        }
    }

    /// Parent id of `model` if it belongs to this kind.
    pub fn parent_of(&self, model: &asset::Model) -> Option<i64> {
        match self {
            EntityKind::Lab => model.lab_id,
            EntityKind::Article => model.article_id,
            EntityKind::Submission => model.submission_id,
        }
    }

    pub(crate) fn set_parent(&self, active: &mut asset::ActiveModel, parent_id: i64) {
        match self {
            EntityKind::Lab => active.lab_id = Set(Some(parent_id)),
            EntityKind::Article => active.article_id = Set(Some(parent_id)),
            EntityKind::Submission => active.submission_id = Set(Some(parent_id)),
        }
    }
}
