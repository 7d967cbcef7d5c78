use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use common::storage::{BlobStore, StorageError};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::database::init_db;
use crate::error::AppError;
use crate::store::EntityKind;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Scratch directory error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// Bounded pool of call slots; every call holds one for its whole duration.
#[derive(Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(size.max(1))),
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AppError> {
        self.slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::Internal("worker pool is shut down".into()))
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    fn close(&self) {
        self.slots.close();
    }
}

/// Process-wide context shared by every call.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub config: Arc<AppConfig>,
    pub workers: WorkerPool,
}

impl AppState {
    /// Assemble a state from already-initialised parts.
    pub fn new(db: DatabaseConnection, blob_store: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        let workers = WorkerPool::new(config.rpc.max_concurrent_calls);
        Self {
            db,
            blob_store,
            config: Arc::new(config),
            workers,
        }
    }

    /// Connect the database, open the blob store and make sure every bucket exists.
    pub async fn init(config: AppConfig) -> Result<Self, InitError> {
        let db = init_db(&config.database).await?;
        info!("Database ready");

        let blob_store: Arc<dyn BlobStore> = match config.storage.backend {
            StorageBackend::Filesystem => Arc::new(
                FilesystemBlobStore::new(config.storage.root.clone(), config.storage.max_blob_size)
                    .await?,
            ),
            StorageBackend::S3 => Arc::new(S3BlobStore::new(
                &config.storage.s3,
                config.storage.max_blob_size,
            )?),
        };

        for kind in EntityKind::ALL {
            blob_store.ensure_bucket(kind.bucket()).await?;
        }
        info!(backend = ?config.storage.backend, "Blob store ready");

        tokio::fs::create_dir_all(&config.storage.scratch_dir).await?;

        Ok(Self::new(db, blob_store, config))
    }

    /// Round-trip the database and confirm every bucket is reachable.
    pub async fn check_health(&self) -> Result<(), InitError> {
        self.db.ping().await?;
        for kind in EntityKind::ALL {
            self.blob_store.ensure_bucket(kind.bucket()).await?;
        }
        Ok(())
    }

    /// Stop accepting calls and close the connection pool.
    pub async fn shutdown(self) -> Result<(), DbErr> {
        self.workers.close();
        self.db.close().await?;
        info!("Shut down");
        Ok(())
    }
}
