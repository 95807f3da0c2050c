//! Blob-store contract for document bytes.
//!
//! The service never streams file content to clients; downloads go through
//! time-limited signed URLs issued by the store.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default (and maximum) lifetime of a download URL.
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("invalid storage request: {0}")]
    Invalid(String),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        CoreError::Upstream(err.to_string())
    }
}

/// HTTP method a signed URL authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlMethod {
    Get,
    Put,
}

/// One object write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Request server-side encryption at rest.
    pub encrypt: bool,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_in: Duration,
    pub expires_at: Timestamp,
}

/// Listing entry for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<Timestamp>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, object: PutObject) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn sign_url(
        &self,
        key: &str,
        ttl: Duration,
        method: UrlMethod,
    ) -> Result<SignedUrl, StorageError>;

    /// `Ok(false)` only when the backend reports the key as missing.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError>;
}
