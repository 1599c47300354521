//! Object store client: the S3 verbs the engine needs, behind a trait.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{Operator, services};
use tracing::debug;

use super::config::StorageConfig;
use super::error::StorageError;

/// A PUT request for one object.
#[derive(Debug, Clone)]
pub struct PutObject {
    /// Object key.
    pub key: String,
    /// Object body.
    pub body: Bytes,
    /// Content type recorded with the object.
    pub content_type: String,
    /// Cache-Control header recorded with the object.
    pub cache_control: String,
}

/// What a HEAD request reports about an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStat {
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded at PUT time.
    pub content_type: Option<String>,
    /// Last modification time as reported by the store.
    pub last_modified: Option<String>,
    /// Entity tag.
    pub etag: Option<String>,
}

/// Presigned URL for upload or download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use (PUT for upload, GET for download).
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
    /// Required headers for the request.
    pub headers: HashMap<String, String>,
}

/// The object store operations used by the storage engine.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, replacing any object with the same key.
    async fn put(&self, object: PutObject) -> Result<(), StorageError>;

    /// Read object metadata. Missing objects yield `StorageError::NotFound`.
    async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Presign a GET request.
    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;

    /// Presign a PUT request for the given content type.
    async fn presign_write(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError>;
}

/// `ObjectStore` backed by an Apache OpenDAL operator.
#[derive(Debug, Clone)]
pub struct OpendalStore {
    operator: Operator,
}

impl OpendalStore {
    /// Create a store for the configured R2 bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn r2(config: &StorageConfig) -> Result<Self, StorageError> {
        let builder = services::S3::default()
            .endpoint(&config.endpoint())
            .bucket(&config.bucket)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.secret_access_key)
            .region(StorageConfig::REGION);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();

        Ok(Self { operator })
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        let capability = self.operator.info().full_capability();
        debug!(key = %object.key, size = object.body.len(), "PUT object");

        let mut write = self.operator.write_with(&object.key, object.body);
        if capability.write_with_content_type {
            write = write.content_type(&object.content_type);
        }
        if capability.write_with_cache_control {
            write = write.cache_control(&object.cache_control);
        }
        write.await.map_err(StorageError::from)?;

        Ok(())
    }

    async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError> {
        let meta = self.operator.stat(key).await.map_err(StorageError::from)?;

        Ok(ObjectStat {
            size: meta.content_length(),
            content_type: meta.content_type().map(String::from),
            last_modified: meta.last_modified().map(|t| t.to_string()),
            etag: meta.etag().map(String::from),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        debug!(key = %key, "DELETE object");
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(StorageError::from)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: expires_at(ttl),
            headers: presigned
                .header()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
                })
                .collect(),
        })
    }

    async fn presign_write(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        // Content-Type is part of the signature, so a PUT with any other
        // type is rejected by the store.
        let presigned = self
            .operator
            .presign_write_with(key, ttl)
            .content_type(content_type)
            .await
            .map_err(StorageError::from)?;

        let mut headers: HashMap<String, String> = presigned
            .header()
            .iter()
            .filter(|(name, _)| !name.as_str().eq_ignore_ascii_case("content-type"))
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        headers.insert("Content-Type".to_string(), content_type.to_string());

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: expires_at(ttl),
            headers,
        })
    }
}

/// Wall-clock expiry for a presign issued now.
pub(crate) fn expires_at(ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
