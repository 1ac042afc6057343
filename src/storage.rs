use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

/// StorageError
///
/// Any failure talking to the object store. Handlers surface it as a 400 upload failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload rejected: {0}")]
    Upload(String),

    #[error("empty file")]
    EmptyFile,
}

// 1. StorageService Contract
/// StorageService
///
/// The object-storage collaborator: accepts a file, returns the public URL it can be read
/// from. The S3 client is used in deployments, `MockStorageService` in tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Only called in `Env::Local` (MinIO).
    async fn ensure_bucket_exists(&self);

    /// Stores `bytes` under `key` and returns the object's public URL.
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// Uploads through the AWS SDK. `force_path_style(true)` keeps MinIO and other
/// S3-compatible gateways happy.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The path-style URL under which an uploaded key is served.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket_name, key)
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent, so errors (e.g. "already owned by you") are ignored.
    async fn ensure_bucket_exists(&self) {
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }
        let key = sanitize_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        tracing::debug!(key = %key, "object uploaded");
        Ok(self.public_url(&key))
    }
}

/// sanitize_key
///
/// Strips directory navigation segments (`..`, `.`) and empty segments from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// object_key
///
/// Builds a collision-free key such as `artworks/<uuid>.png`, keeping only the extension of
/// the client's filename.
pub fn object_key(prefix: &str, filename: Option<&str>) -> String {
    let extension = filename
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    format!("{}/{}.{}", prefix, Uuid::new_v4(), extension)
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// Records uploaded keys and returns deterministic URLs; `new_failing` rejects every upload.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    pub uploaded: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploaded.lock().map(|keys| keys.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(
        &self,
        key: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Upload(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        let sanitized_key = sanitize_key(key);
        if let Ok(mut keys) = self.uploaded.lock() {
            keys.push(sanitized_key.clone());
        }
        Ok(format!("http://localhost:9000/mock-bucket/{}", sanitized_key))
    }
}

/// StorageState
///
/// The shared handle to the storage service held in `AppState`.
pub type StorageState = Arc<dyn StorageService>;
