use std::path::PathBuf;

use serde::Deserialize;

/// Which [`BlobStore`](crate::storage::BlobStore) implementation to build.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    /// Endpoint URL. Default: "http://localhost:9000" (MinIO).
    #[serde(default = "default_s3_endpoint")]
    pub endpoint: String,
    /// Region name. Default: "us-east-1".
    #[serde(default = "default_s3_region")]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Use path-style addressing (required by MinIO). Default: true.
    #[serde(default = "default_s3_path_style")]
    pub path_style: bool,
}

fn default_s3_endpoint() -> String {
    "http://localhost:9000".into()
}
fn default_s3_region() -> String {
    "us-east-1".into()
}
fn default_s3_path_style() -> bool {
    true
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: default_s3_endpoint(),
            region: default_s3_region(),
            access_key: String::new(),
            secret_key: String::new(),
            path_style: default_s3_path_style(),
        }
    }
}

/// Blob storage and staging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend to use. Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Directory for per-call upload scratch files. Default: the OS temp dir.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Largest accepted asset in bytes. Default: 128 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
    /// Size of download chunk frames in bytes. Default: 8 KiB.
    #[serde(default = "default_download_chunk_size")]
    pub download_chunk_size: usize,
    #[serde(default)]
    pub s3: S3Config,
}

fn default_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}
fn default_max_blob_size() -> u64 {
    128 * 1024 * 1024
}
fn default_download_chunk_size() -> usize {
    8 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_root(),
            scratch_dir: default_scratch_dir(),
            max_blob_size: default_max_blob_size(),
            download_chunk_size: default_download_chunk_size(),
            s3: S3Config::default(),
        }
    }
}
