//! Call surface, one service per entity kind.
//!
//! Transport-agnostic: inbound streams are any [`futures::Stream`] of frames
//! and downloads come back as a boxed stream, so a gRPC or HTTP/2 server only
//! has to adapt its own request and response types. Every call holds a
//! worker slot while it runs and reports failures as a [`Status`].

mod entities;

pub use entities::EntityService;

use futures::Stream;

use crate::error::Status;
use crate::models::asset::{
    Asset, AssetList, DeleteAssetResponse, ListAssetsRequest, UpdateFrame, UploadFrame,
};
use crate::models::entity::DeleteEntityResponse;
use crate::pipeline::{self, download::DownloadStream};
use crate::state::AppState;
use crate::store::EntityKind;

/// Asset calls of one entity kind.
#[derive(Clone)]
pub struct AssetService {
    kind: EntityKind,
    state: AppState,
}

impl AssetService {
    pub fn new(kind: EntityKind, state: AppState) -> Self {
        Self { kind, state }
    }

    pub fn lab(state: AppState) -> Self {
        Self::new(EntityKind::Lab, state)
    }

    pub fn article(state: AppState) -> Self {
        Self::new(EntityKind::Article, state)
    }

    pub fn submission(state: AppState) -> Self {
        Self::new(EntityKind::Submission, state)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub async fn upload_asset<S>(&self, frames: S) -> Result<Asset, Status>
    where
        S: Stream<Item = Result<UploadFrame, Status>> + Send + Unpin,
    {
        let _permit = self.state.workers.acquire().await?;
        Ok(pipeline::upload::upload_asset(&self.state, self.kind, frames).await?)
    }

    pub async fn update_asset<S>(&self, frames: S) -> Result<Asset, Status>
    where
        S: Stream<Item = Result<UpdateFrame, Status>> + Send + Unpin,
    {
        let _permit = self.state.workers.acquire().await?;
        Ok(pipeline::update::update_asset(&self.state, self.kind, frames).await?)
    }

    /// The worker slot moves into the returned stream's producer.
    pub async fn download_asset(&self, asset_id: i64) -> Result<DownloadStream, Status> {
        let permit = self.state.workers.acquire().await?;
        Ok(pipeline::download::download_asset(&self.state, self.kind, asset_id, permit).await?)
    }

    pub async fn delete_asset(&self, asset_id: i64) -> Result<DeleteAssetResponse, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(pipeline::delete::delete_asset(&self.state, self.kind, asset_id).await?)
    }

    pub async fn list_assets(&self, req: ListAssetsRequest) -> Result<AssetList, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(pipeline::listing::list_assets(&self.state, self.kind, req).await?)
    }

    pub async fn get_asset(&self, asset_id: i64) -> Result<Asset, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(pipeline::listing::get_asset(&self.state, self.kind, asset_id).await?)
    }

    /// Delete the parent entity `parent_id` and every asset it owns.
    pub async fn delete_entity(&self, parent_id: i64) -> Result<DeleteEntityResponse, Status> {
        let _permit = self.state.workers.acquire().await?;
        Ok(pipeline::delete::delete_entity(&self.state, self.kind, parent_id).await?)
    }
}
