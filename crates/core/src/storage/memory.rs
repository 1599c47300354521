//! In-process object store that records every call.
//!
//! Stands in for R2 in tests: uploads can be checked for zero PUTs, and a
//! forced failure exercises the store-error paths.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use super::error::StorageError;
use super::store::{ObjectStat, ObjectStore, PresignedUrl, PutObject, expires_at};

/// An object held by `MemoryStore`.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object body.
    pub body: Bytes,
    /// Content type recorded at PUT time.
    pub content_type: String,
    /// Cache-Control recorded at PUT time.
    pub cache_control: String,
    /// RFC 3339 write time.
    pub last_modified: String,
    /// Entity tag.
    pub etag: String,
}

/// Number of calls per verb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// PUT calls.
    pub put: usize,
    /// HEAD calls.
    pub stat: usize,
    /// DELETE calls.
    pub delete: usize,
    /// Presign calls (read and write).
    pub presign: usize,
}

impl CallCounts {
    /// Total calls of any kind.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.put + self.stat + self.delete + self.presign
    }
}

/// `ObjectStore` kept in a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    calls: Mutex<CallCounts>,
    failure: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        *lock(&self.calls)
    }

    /// Snapshot of a stored object.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        lock(&self.objects).get(key).cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.objects).is_empty()
    }

    /// Make every following call fail with `StorageError::Operation(message)`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    fn record(&self, bump: impl FnOnce(&mut CallCounts)) -> Result<(), StorageError> {
        bump(&mut lock(&self.calls));
        match lock(&self.failure).as_ref() {
            Some(message) => Err(StorageError::operation(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        self.record(|c| c.put += 1)?;

        let mut objects = lock(&self.objects);
        let etag = format!("\"{}-{}\"", object.body.len(), objects.len() + 1);
        objects.insert(
            object.key,
            StoredObject {
                body: object.body,
                content_type: object.content_type,
                cache_control: object.cache_control,
                last_modified: Utc::now().to_rfc3339(),
                etag,
            },
        );
        Ok(())
    }

    async fn stat(&self, key: &str) -> Result<ObjectStat, StorageError> {
        self.record(|c| c.stat += 1)?;

        lock(&self.objects)
            .get(key)
            .map(|o| ObjectStat {
                size: o.body.len() as u64,
                content_type: Some(o.content_type.clone()),
                last_modified: Some(o.last_modified.clone()),
                etag: Some(o.etag.clone()),
            })
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.record(|c| c.delete += 1)?;
        lock(&self.objects).remove(key);
        Ok(())
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        self.record(|c| c.presign += 1)?;
        Ok(presigned("GET", key, ttl, HashMap::new()))
    }

    async fn presign_write(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        self.record(|c| c.presign += 1)?;
        let headers = HashMap::from([("Content-Type".to_string(), content_type.to_string())]);
        Ok(presigned("PUT", key, ttl, headers))
    }
}

fn presigned(
    method: &str,
    key: &str,
    ttl: Duration,
    headers: HashMap<String, String>,
) -> PresignedUrl {
    PresignedUrl {
        url: format!(
            "memory://bucket/{key}?X-Amz-Method={method}&X-Amz-Expires={}",
            ttl.as_secs()
        ),
        method: method.to_string(),
        expires_at: expires_at(ttl),
        headers,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
