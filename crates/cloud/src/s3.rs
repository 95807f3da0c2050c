//! S3 (or S3-compatible) document store.
//!
//! Objects are written with `AES256` server-side encryption when the caller
//! asks for it. Clients never receive bytes from the API; they follow the
//! presigned URLs issued here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use dealroom_core::storage::{
    DocumentStore, PutObject, SignedUrl, StorageError, StoredObject, UrlMethod,
};

/// Connection settings for the document bucket.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    /// Region override; the SDK default chain applies when unset.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    pub endpoint: Option<String>,
    /// Path-style addressing, usually required with a custom endpoint.
    pub force_path_style: bool,
}

#[derive(Debug, Clone)]
pub struct S3DocumentStore {
    client: Client,
    bucket: String,
}

impl S3DocumentStore {
    /// Build a client from the SDK's default credential chain plus `config`.
    pub async fn connect(config: &S3Config) -> Result<Self, StorageError> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::Invalid("bucket name is empty".into()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }

        tracing::info!(
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            "S3 document store configured"
        );
        Ok(Self {
            client: Client::from_conf(s3_builder.build()),
            bucket: config.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn backend<E: std::fmt::Display>(err: E) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        let metadata: HashMap<String, String> = object.metadata.into_iter().collect();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.bytes))
            .content_type(object.content_type)
            .set_metadata(Some(metadata));
        if object.encrypt {
            request = request.server_side_encryption(ServerSideEncryption::Aes256);
        }
        request.send().await.map_err(|err| {
            tracing::error!(key = %object.key, error = %err, "S3 put_object failed");
            backend(err)
        })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn sign_url(
        &self,
        key: &str,
        ttl: Duration,
        method: UrlMethod,
    ) -> Result<SignedUrl, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|err| StorageError::Invalid(err.to_string()))?;
        let issued_at = Utc::now();

        let request = match method {
            UrlMethod::Get => self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(backend)?,
            UrlMethod::Put => self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(backend)?,
        };

        let ttl_chrono = chrono::Duration::from_std(ttl)
            .map_err(|err| StorageError::Invalid(err.to_string()))?;
        Ok(SignedUrl {
            url: request.uri().to_string(),
            expires_in: ttl,
            expires_at: issued_at + ttl_chrono,
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => {
                tracing::warn!(key, error = %err, "S3 head_object failed");
                Err(backend(err))
            }
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(backend)?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                objects.push(StoredObject {
                    key: key.to_string(),
                    size: object.size().unwrap_or_default(),
                    last_modified: object.last_modified().and_then(to_chrono),
                });
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(objects)
    }
}
