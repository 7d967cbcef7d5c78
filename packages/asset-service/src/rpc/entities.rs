use crate::entity::{article, lab, submission};
use crate::error::Status;
use crate::models::entity::{EntityRecord, NewArticle, NewLab, NewSubmission};
use crate::state::AppState;
use crate::store::{self, EntityKind};

/// Creation and lookup of the rows that own assets.
#[derive(Clone)]
pub struct EntityService {
    state: AppState,
}

impl EntityService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn create_lab(&self, new: NewLab) -> Result<lab::Model, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(store::entity::create_lab(&self.state.db, new).await?)
    }

    pub async fn create_article(&self, new: NewArticle) -> Result<article::Model, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(store::entity::create_article(&self.state.db, new).await?)
    }

    pub async fn create_submission(&self, new: NewSubmission) -> Result<submission::Model, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(store::entity::create_submission(&self.state.db, new).await?)
    }

    pub async fn get_entity(&self, kind: EntityKind, id: i64) -> Result<EntityRecord, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(store::entity::find_entity(&self.state.db, kind, id).await?)
    }
}
