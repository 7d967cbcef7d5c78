use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::asset;
use crate::store::EntityKind;

/// Asset record returned by every asset call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub asset_id: i64,
    /// Id of the owning lab, article or submission.
    pub parent_id: i64,
    pub filename: String,
    pub filesize: i64,
    pub upload_date: DateTime<Utc>,
}

impl Asset {
    /// Build the record from a row owned by `kind`; `None` if the row belongs to another kind.
    pub fn from_model(kind: EntityKind, model: asset::Model) -> Option<Self> {
        Some(Self {
            asset_id: model.id,
            parent_id: kind.parent_of(&model)?,
            filename: model.filename,
            filesize: model.filesize,
            upload_date: model.upload_date,
        })
    }
}

/// Leading frame of an upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub parent_id: i64,
    pub filename: String,
    /// Announced size in bytes; must match the bytes that follow.
    pub size: i64,
}

/// One inbound frame of `UploadAsset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFrame {
    Metadata(UploadMetadata),
    Chunk(Bytes),
}

/// Leading frame of an update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMetadata {
    pub asset_id: i64,
    pub filename: String,
    pub size: i64,
}

/// One inbound frame of `UpdateAsset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateFrame {
    Metadata(UpdateMetadata),
    Chunk(Bytes),
}

/// One outbound frame of `DownloadAsset`: the record first, then content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadFrame {
    Asset(Asset),
    Chunk(Bytes),
}

/// Inbound frame types share the chunk payload; everything else is metadata.
pub trait ChunkFrame {
    type Metadata;

    /// Split the frame into its chunk bytes or its metadata.
    fn into_parts(self) -> Result<Bytes, Self::Metadata>;
}

impl ChunkFrame for UploadFrame {
    type Metadata = UploadMetadata;

    fn into_parts(self) -> Result<Bytes, UploadMetadata> {
        match self {
            UploadFrame::Chunk(bytes) => Ok(bytes),
            UploadFrame::Metadata(meta) => Err(meta),
        }
    }
}

impl ChunkFrame for UpdateFrame {
    type Metadata = UpdateMetadata;

    fn into_parts(self) -> Result<Bytes, UpdateMetadata> {
        match self {
            UpdateFrame::Chunk(bytes) => Ok(bytes),
            UpdateFrame::Metadata(meta) => Err(meta),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAssetResponse {
    pub success: bool,
}

/// Request of `ListAssets`. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAssetsRequest {
    pub parent_id: i64,
    pub page_number: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AssetList {
    /// Number of assets the parent owns across all pages.
    pub total_count: u64,
    pub assets: Vec<Asset>,
}
