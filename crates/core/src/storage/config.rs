//! Object store client configuration.

use stowage_shared::StorageSettings;

use super::error::StorageError;

/// Connection settings for one Cloudflare R2 bucket.
#[derive(Clone)]
pub struct StorageConfig {
    /// Cloudflare account ID.
    pub account_id: String,
    /// R2 access key ID.
    pub access_key_id: String,
    /// R2 secret access key.
    pub secret_access_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Public base URL without a trailing slash.
    pub public_url: Option<String>,
    /// Presigned URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_ttl_secs: u64,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[hidden]")
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .field("presign_ttl_secs", &self.presign_ttl_secs)
            .finish()
    }
}

impl StorageConfig {
    /// Default presigned URL TTL: 1 hour.
    pub const DEFAULT_PRESIGN_TTL: u64 = 3600;
    /// R2 accepts any region name; `auto` is the documented one.
    pub const REGION: &'static str = "auto";

    /// Create a config, failing if a required value is empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` naming the first missing value.
    pub fn new(
        account_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        bucket: impl Into<String>,
        public_url: Option<String>,
    ) -> Result<Self, StorageError> {
        let config = Self {
            account_id: required("account_id", account_id.into())?,
            access_key_id: required("access_key_id", access_key_id.into())?,
            secret_access_key: required("secret_access_key", secret_access_key.into())?,
            bucket: required("bucket_name", bucket.into())?,
            public_url: public_url
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            presign_ttl_secs: Self::DEFAULT_PRESIGN_TTL,
        };
        Ok(config)
    }

    /// Create a config from loaded application settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if a required value is empty.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        Self::new(
            settings.account_id.clone(),
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            settings.bucket_name.clone(),
            settings.public_url.clone(),
        )
    }

    /// Account-scoped R2 endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

fn required(name: &str, value: String) -> Result<String, StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::configuration(format!("{name} is not set")));
    }
    Ok(value)
}
