//! Storage engine: validation, key generation, and URL issuance.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::config::StorageConfig;
use super::content::FileContent;
use super::error::StorageError;
use super::key::generate_key;
use super::policy::{ALLOWED_FILE_TYPES, UploadPolicy};
use super::store::{ObjectStore, OpendalStore, PresignedUrl, PutObject};

/// Cache-Control recorded on every uploaded object (one year, public).
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Folder used by image uploads when the caller names none.
pub const DEFAULT_IMAGE_FOLDER: &str = "images";

/// Options for a general upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Folder prefix for the key.
    pub folder: Option<String>,
    /// Return the public URL instead of a signed one when available.
    pub is_public: bool,
    /// Size ceiling override in bytes.
    pub max_size: Option<u64>,
    /// Allow-list override.
    pub allowed_types: Option<Vec<String>>,
}

impl UploadOptions {
    /// Set the folder.
    #[must_use]
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Mark the upload public.
    #[must_use]
    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Override the size ceiling.
    #[must_use]
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Override the allow-list.
    #[must_use]
    pub fn allowed_types(mut self, types: Vec<String>) -> Self {
        self.allowed_types = Some(types);
        self
    }
}

/// Options for an image upload. Size and type policy are fixed.
#[derive(Debug, Clone, Default)]
pub struct ImageUploadOptions {
    /// Folder prefix; `images` when absent.
    pub folder: Option<String>,
    /// Return the public URL instead of a signed one when available.
    pub is_public: bool,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Generated object key.
    pub key: String,
    /// Public or signed URL.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type as stored.
    pub content_type: String,
}

/// Object metadata returned by a HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded at upload.
    pub content_type: Option<String>,
    /// Last modification time.
    pub last_modified: Option<String>,
    /// Entity tag.
    pub etag: Option<String>,
}

/// Uploads, reads and deletes objects in one bucket.
pub struct StorageEngine {
    store: Arc<dyn ObjectStore>,
    public_url: Option<String>,
    presign_ttl: Duration,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("public_url", &self.public_url)
            .field("presign_ttl", &self.presign_ttl)
            .finish_non_exhaustive()
    }
}

impl StorageEngine {
    /// Create an engine over any store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> Self {
        Self {
            store,
            public_url: config.public_url.clone(),
            presign_ttl: Duration::from_secs(config.presign_ttl_secs),
        }
    }

    /// Create an engine talking to the configured R2 bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the store client cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let store = OpendalStore::r2(config)?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// Upload a file under the general policy, or the caller's overrides.
    ///
    /// Validation runs before anything is sent to the store.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` / `InvalidContentType` on policy violations,
    /// or the store's error if the PUT or presign fails.
    pub async fn upload_file(
        &self,
        content: &FileContent,
        options: UploadOptions,
    ) -> Result<UploadResult, StorageError> {
        let policy = UploadPolicy::files().with_overrides(options.max_size, options.allowed_types);
        self.upload_with_policy(content, options.folder.as_deref(), options.is_public, &policy)
            .await
    }

    /// Upload an image: 5MB ceiling, image types only, `images` folder by default.
    ///
    /// # Errors
    ///
    /// Same as [`StorageEngine::upload_file`].
    pub async fn upload_image(
        &self,
        content: &FileContent,
        options: ImageUploadOptions,
    ) -> Result<UploadResult, StorageError> {
        let folder = options
            .folder
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_FOLDER.to_string());

        self.upload_with_policy(content, Some(&folder), options.is_public, &UploadPolicy::images())
            .await
    }

    async fn upload_with_policy(
        &self,
        content: &FileContent,
        folder: Option<&str>,
        is_public: bool,
        policy: &UploadPolicy,
    ) -> Result<UploadResult, StorageError> {
        policy.validate(content.len(), content.content_type())?;

        let key = generate_key(content.filename(), folder);
        self.store
            .put(PutObject {
                key: key.clone(),
                body: content.bytes(),
                content_type: content.content_type().to_string(),
                cache_control: CACHE_CONTROL.to_string(),
            })
            .await?;

        let url = match self.public_url_for(&key).filter(|_| is_public) {
            Some(url) => url,
            None => self.signed_download_url(&key, None).await?.url,
        };

        info!(
            key = %key,
            size = content.len(),
            content_type = %content.content_type(),
            is_public,
            "Object uploaded"
        );

        Ok(UploadResult {
            key,
            url,
            size: content.len(),
            content_type: content.content_type().to_string(),
        })
    }

    /// Public URL for a key, if a public base URL is configured.
    #[must_use]
    pub fn public_url_for(&self, key: &str) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{base}/{key}"))
    }

    /// Time-limited GET URL. Existence is not checked.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning fails.
    pub async fn signed_download_url(
        &self,
        key: &str,
        expires_in: Option<Duration>,
    ) -> Result<PresignedUrl, StorageError> {
        let ttl = expires_in.unwrap_or(self.presign_ttl);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Presigning download");
        self.store.presign_read(key, ttl).await
    }

    /// Time-limited PUT URL for direct client uploads.
    ///
    /// Only the content type is checked here; the store enforces no size
    /// limit on presigned PUTs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidContentType` for types outside the general
    /// allow-list, or an error if presigning fails.
    pub async fn signed_upload_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Option<Duration>,
    ) -> Result<PresignedUrl, StorageError> {
        if !ALLOWED_FILE_TYPES.contains(&content_type) {
            return Err(StorageError::invalid_content_type(content_type));
        }

        let ttl = expires_in.unwrap_or(self.presign_ttl);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Presigning upload");
        self.store.presign_write(key, content_type, ttl).await
    }

    /// Delete an object. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the DELETE.
    pub async fn delete_file(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(key).await?;
        info!(key = %key, "Object deleted");
        Ok(())
    }

    /// Whether an object exists. Only not-found maps to `false`.
    ///
    /// # Errors
    ///
    /// Returns any store error other than not-found.
    pub async fn file_exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.store.stat(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Metadata of an existing object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent, or the store's error.
    pub async fn file_metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let stat = self.store.stat(key).await.map_err(|e| e.for_key(key))?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: stat.size,
            content_type: stat.content_type,
            last_modified: stat.last_modified,
            etag: stat.etag,
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
