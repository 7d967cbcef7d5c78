use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, Iter};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use asset_service::config::{AppConfig, DatabaseConfig, RpcConfig, StorageConfig};
use asset_service::database::init_db;
use asset_service::error::Status;
use asset_service::models::asset::{
    Asset, DownloadFrame, UpdateFrame, UpdateMetadata, UploadFrame, UploadMetadata,
};
use asset_service::models::entity::{NewArticle, NewLab, NewSubmission};
use asset_service::pipeline::download::DownloadStream;
use asset_service::state::AppState;
use asset_service::{AssetService, EntityKind, EntityService};
use ::common::storage::filesystem::FilesystemBlobStore;
use ::common::storage::{BlobInfo, BlobKey, BlobStore, BoxReader, StorageError};

/// Blobs larger than this are rejected in tests.
pub const MAX_BLOB_SIZE: u64 = 64 * 1024;

/// Download chunk size used by every test app.
pub const CHUNK_SIZE: usize = 256;

pub type FrameStream<F> = Iter<std::vec::IntoIter<Result<F, Status>>>;

/// Switches that make the wrapped blob store fail on demand.
#[derive(Default)]
pub struct Faults {
    pub fail_put: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_remove: AtomicBool,
    /// Reads fail once this many bytes of a blob have been served.
    pub fail_read_after: Mutex<Option<usize>>,
}

impl Faults {
    pub fn set_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn set_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn set_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub fn set_read_limit(&self, bytes: Option<usize>) {
        *self.fail_read_after.lock().unwrap() = bytes;
    }
}

/// Reader that fails every read.
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::other("injected read failure")))
    }
}

/// Filesystem blob store with injectable failures.
pub struct FaultyBlobStore {
    inner: FilesystemBlobStore,
    faults: Arc<Faults>,
}

fn injected(op: &str) -> StorageError {
    StorageError::Backend(format!("injected {op} failure"))
}

#[async_trait]
impl BlobStore for FaultyBlobStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.inner.ensure_bucket(bucket).await
    }

    async fn put_stream(
        &self,
        key: &BlobKey,
        reader: BoxReader,
        size: u64,
    ) -> Result<(), StorageError> {
        if self.faults.fail_put.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.inner.put_stream(key, reader, size).await
    }

    async fn get_stream(&self, key: &BlobKey) -> Result<BoxReader, StorageError> {
        if self.faults.fail_get.load(Ordering::SeqCst) {
            return Err(injected("get"));
        }
        let limit = *self.faults.fail_read_after.lock().unwrap();
        match limit {
            Some(limit) => {
                let mut prefix = self.inner.get(key).await?;
                prefix.truncate(limit);
                Ok(Box::new(Cursor::new(prefix).chain(BrokenReader)))
            }
            None => self.inner.get_stream(key).await,
        }
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }

    async fn remove(&self, key: &BlobKey) -> Result<bool, StorageError> {
        if self.faults.fail_remove.load(Ordering::SeqCst) {
            return Err(injected("remove"));
        }
        self.inner.remove(key).await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, StorageError> {
        self.inner.list(bucket, prefix).await
    }
}

/// A fully wired service over a throwaway SQLite database and blob directory.
pub struct TestApp {
    pub state: AppState,
    pub labs: AssetService,
    pub articles: AssetService,
    pub submissions: AssetService,
    pub entities: EntityService,
    pub faults: Arc<Faults>,
    scratch_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(RpcConfig::default()).await
    }

    pub async fn spawn_with(rpc: RpcConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = test_config(dir.path(), rpc);
        let scratch_dir = config.storage.scratch_dir.clone();
        std::fs::create_dir_all(&scratch_dir).expect("Failed to create scratch dir");

        let db = init_db(&config.database)
            .await
            .expect("Failed to initialize test database");

        let inner = FilesystemBlobStore::new(config.storage.root.clone(), MAX_BLOB_SIZE)
            .await
            .expect("Failed to create blob store");
        let faults = Arc::new(Faults::default());
        let store = FaultyBlobStore {
            inner,
            faults: faults.clone(),
        };
        for kind in EntityKind::ALL {
            store
                .ensure_bucket(kind.bucket())
                .await
                .expect("Failed to create bucket");
        }

        let state = AppState::new(db, Arc::new(store), config);

        Self {
            labs: AssetService::lab(state.clone()),
            articles: AssetService::article(state.clone()),
            submissions: AssetService::submission(state.clone()),
            entities: EntityService::new(state.clone()),
            state,
            faults,
            scratch_dir,
            _dir: dir,
        }
    }

    pub fn service(&self, kind: EntityKind) -> &AssetService {
        match kind {
            EntityKind::Lab => &self.labs,
            EntityKind::Article => &self.articles,
            EntityKind::Submission => &self.submissions,
        }
    }

    pub async fn create_lab(&self, title: &str) -> i64 {
        self.entities
            .create_lab(NewLab {
                owner_id: 1,
                title: title.to_string(),
                summary: None,
            })
            .await
            .expect("Failed to create lab")
            .id
    }

    pub async fn create_article(&self, title: &str) -> i64 {
        self.entities
            .create_article(NewArticle {
                owner_id: 1,
                title: title.to_string(),
                summary: Some("About things".to_string()),
            })
            .await
            .expect("Failed to create article")
            .id
    }

    pub async fn create_submission(&self, lab_id: i64) -> i64 {
        self.entities
            .create_submission(NewSubmission {
                lab_id,
                owner_id: 2,
            })
            .await
            .expect("Failed to create submission")
            .id
    }

    /// Create a parent of `kind`; submissions get a fresh lab of their own.
    pub async fn create_parent(&self, kind: EntityKind) -> i64 {
        match kind {
            EntityKind::Lab => self.create_lab("Parent lab").await,
            EntityKind::Article => self.create_article("Parent article").await,
            EntityKind::Submission => {
                let lab_id = self.create_lab("Submission lab").await;
                self.create_submission(lab_id).await
            }
        }
    }

    /// Upload `data` in `CHUNK_SIZE` pieces, announcing its exact length.
    pub async fn upload(
        &self,
        kind: EntityKind,
        parent_id: i64,
        filename: &str,
        data: &[u8],
    ) -> Result<Asset, Status> {
        self.service(kind)
            .upload_asset(upload_frames(parent_id, filename, data))
            .await
    }

    pub async fn update(
        &self,
        kind: EntityKind,
        asset_id: i64,
        filename: &str,
        data: &[u8],
    ) -> Result<Asset, Status> {
        self.service(kind)
            .update_asset(update_frames(asset_id, filename, data))
            .await
    }

    /// Download an asset and return its record, its content and the chunk sizes.
    pub async fn download(
        &self,
        kind: EntityKind,
        asset_id: i64,
    ) -> Result<(Asset, Vec<u8>, Vec<usize>), Status> {
        let stream = self.service(kind).download_asset(asset_id).await?;
        collect_download(stream).await
    }

    pub async fn blob_exists(&self, kind: EntityKind, parent_id: i64, filename: &str) -> bool {
        let key = BlobKey::for_asset(kind.bucket(), parent_id, filename).expect("valid key");
        self.state
            .blob_store
            .exists(&key)
            .await
            .expect("Failed to check blob")
    }

    /// Remove a blob behind the service's back.
    pub async fn drop_blob(&self, kind: EntityKind, parent_id: i64, filename: &str) {
        let key = BlobKey::for_asset(kind.bucket(), parent_id, filename).expect("valid key");
        assert!(
            self.state
                .blob_store
                .remove(&key)
                .await
                .expect("Failed to remove blob")
        );
    }

    pub async fn blob_count(&self, kind: EntityKind) -> usize {
        self.state
            .blob_store
            .list(kind.bucket(), "")
            .await
            .expect("Failed to list blobs")
            .len()
    }

    /// Number of files left in the scratch directory.
    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch_dir)
            .expect("Failed to read scratch dir")
            .count()
    }
}

/// Configuration rooted in `dir`: SQLite file, blob root and scratch directory.
pub fn test_config(dir: &Path, rpc: RpcConfig) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.join("meta.db").display()),
            max_connections: 5,
            min_connections: 1,
        },
        storage: StorageConfig {
            root: dir.join("blobs"),
            scratch_dir: dir.join("scratch"),
            max_blob_size: MAX_BLOB_SIZE,
            download_chunk_size: CHUNK_SIZE,
            ..Default::default()
        },
        rpc,
    }
}

/// Deterministic test content of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn chunks(data: &[u8]) -> impl Iterator<Item = Bytes> + '_ {
    data.chunks(CHUNK_SIZE).map(Bytes::copy_from_slice)
}

pub fn upload_frames(parent_id: i64, filename: &str, data: &[u8]) -> FrameStream<UploadFrame> {
    let mut frames = vec![Ok(UploadFrame::Metadata(UploadMetadata {
        parent_id,
        filename: filename.to_string(),
        size: data.len() as i64,
    }))];
    frames.extend(chunks(data).map(|c| Ok(UploadFrame::Chunk(c))));
    stream::iter(frames)
}

pub fn update_frames(asset_id: i64, filename: &str, data: &[u8]) -> FrameStream<UpdateFrame> {
    let mut frames = vec![Ok(UpdateFrame::Metadata(UpdateMetadata {
        asset_id,
        filename: filename.to_string(),
        size: data.len() as i64,
    }))];
    frames.extend(chunks(data).map(|c| Ok(UpdateFrame::Chunk(c))));
    stream::iter(frames)
}

/// Any frame list as an inbound stream.
pub fn frames<F>(frames: Vec<Result<F, Status>>) -> FrameStream<F> {
    stream::iter(frames)
}

pub async fn collect_download(
    mut stream: DownloadStream,
) -> Result<(Asset, Vec<u8>, Vec<usize>), Status> {
    let asset = match stream.next().await {
        Some(Ok(DownloadFrame::Asset(asset))) => asset,
        Some(Ok(DownloadFrame::Chunk(_))) => panic!("first download frame must be the asset"),
        Some(Err(status)) => return Err(status),
        None => panic!("download stream ended without frames"),
    };

    let mut content = Vec::new();
    let mut sizes = Vec::new();
    while let Some(frame) = stream.next().await {
        match frame? {
            DownloadFrame::Chunk(bytes) => {
                sizes.push(bytes.len());
                content.extend_from_slice(&bytes);
            }
            DownloadFrame::Asset(_) => panic!("asset frame after content"),
        }
    }
    Ok((asset, content, sizes))
}
