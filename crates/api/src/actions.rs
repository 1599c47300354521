//! Upload action layer.
//!
//! Every action resolves the caller's session first and reports its
//! outcome as an [`ActionResult`]; handlers and [`crate::client::UploadClient`]
//! render it as an [`ActionResponse`].

use std::sync::Arc;

use axum::http::HeaderMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use stowage_core::storage::{
    FileContent, ImageUploadOptions, ObjectMetadata, StorageEngine, StorageError, UploadOptions,
    UploadResult,
};
use stowage_shared::{AppError, Session};

use crate::auth::AuthProvider;

/// Result of an upload action.
pub type ActionResult<T> = Result<T, ActionError>;

/// Why an action failed. The display string is what the UI shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// No session.
    #[error("Unauthorized")]
    Unauthorized,

    /// The key does not exist.
    #[error("File not found")]
    NotFound,

    /// Input rejected before reaching the store.
    #[error("{0}")]
    Validation(String),

    /// The store failed.
    #[error("{0}")]
    Storage(String),
}

impl ActionError {
    /// Map an engine error, substituting `fallback` for an empty message.
    #[must_use]
    pub fn from_storage(err: StorageError, fallback: &str) -> Self {
        if err.is_validation() {
            return Self::Validation(err.to_string());
        }
        match err {
            StorageError::NotFound { .. } => Self::NotFound,
            other => {
                let message = other.to_string();
                if message.trim().is_empty() {
                    Self::Storage(fallback.to_string())
                } else {
                    Self::Storage(message)
                }
            }
        }
    }
}

impl From<&ActionError> for AppError {
    fn from(err: &ActionError) -> Self {
        let message = err.to_string();
        match err {
            ActionError::Unauthorized => Self::Unauthorized(message),
            ActionError::NotFound => Self::NotFound(message),
            ActionError::Validation(_) => Self::Validation(message),
            ActionError::Storage(_) => Self::ExternalService(message),
        }
    }
}

/// Uniform `{ success, data | error }` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse<T> {
    /// Whether the action succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<ActionResult<T>> for ActionResponse<T> {
    fn from(result: ActionResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Fields of an upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    /// The `file` field.
    pub file: Option<FileContent>,
    /// The `folder` field. Blank means none.
    pub folder: Option<String>,
    /// The `isPublic` field.
    pub is_public: bool,
}

impl UploadForm {
    fn folder(&self) -> Option<String> {
        self.folder
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    }
}

/// Signed URL for an existing object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUrl {
    /// Signed GET URL, valid for an hour.
    pub url: String,
    /// Object key.
    pub key: String,
}

/// Confirmation of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deleted {
    /// The deleted key.
    pub key: String,
}

/// The five upload actions, gated on a session.
pub struct UploadActions {
    engine: Arc<StorageEngine>,
    auth: Arc<dyn AuthProvider>,
}

impl UploadActions {
    /// Create the action layer.
    #[must_use]
    pub fn new(engine: Arc<StorageEngine>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { engine, auth }
    }

    /// Resolve the caller's session or fail with `Unauthorized`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when there is no session or the lookup fails.
    pub async fn require_session(&self, headers: &HeaderMap) -> ActionResult<Session> {
        match self.auth.get_session(headers).await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(ActionError::Unauthorized),
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                Err(ActionError::Unauthorized)
            }
        }
    }

    async fn require_existing(&self, key: &str, fallback: &str) -> ActionResult<()> {
        if key.trim().is_empty() {
            return Err(ActionError::Validation("No key provided".to_string()));
        }
        match self.engine.file_exists(key).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ActionError::NotFound),
            Err(e) => {
                error!(key = %key, error = %e, "Existence check failed");
                Err(ActionError::from_storage(e, fallback))
            }
        }
    }

    /// Upload any allowed file.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without a session, `Validation` for a missing file or
    /// a policy violation, `Storage` if the store fails.
    pub async fn upload_file(
        &self,
        headers: &HeaderMap,
        form: UploadForm,
    ) -> ActionResult<UploadResult> {
        let session = self.require_session(headers).await?;
        let folder = form.folder();
        let file = form
            .file
            .ok_or_else(|| ActionError::Validation("No file provided".to_string()))?;

        let options = UploadOptions {
            folder,
            is_public: form.is_public,
            ..UploadOptions::default()
        };

        self.engine
            .upload_file(&file, options)
            .await
            .map_err(|e| {
                error!(user_id = %session.user.id, error = %e, "File upload failed");
                ActionError::from_storage(e, "Upload failed")
            })
    }

    /// Upload an image into `images/` unless a folder is given.
    ///
    /// # Errors
    ///
    /// Same as [`UploadActions::upload_file`].
    pub async fn upload_image(
        &self,
        headers: &HeaderMap,
        form: UploadForm,
    ) -> ActionResult<UploadResult> {
        let session = self.require_session(headers).await?;
        let folder = form.folder();
        let file = form
            .file
            .ok_or_else(|| ActionError::Validation("No file provided".to_string()))?;

        let options = ImageUploadOptions {
            folder,
            is_public: form.is_public,
        };

        self.engine
            .upload_image(&file, options)
            .await
            .map_err(|e| {
                error!(user_id = %session.user.id, error = %e, "Image upload failed");
                ActionError::from_storage(e, "Upload failed")
            })
    }

    /// Signed download URL for an existing object.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, or `Storage`.
    pub async fn get_file_url(&self, headers: &HeaderMap, key: &str) -> ActionResult<FileUrl> {
        const FALLBACK: &str = "Failed to get file URL";

        self.require_session(headers).await?;
        self.require_existing(key, FALLBACK).await?;

        let presigned = self
            .engine
            .signed_download_url(key, None)
            .await
            .map_err(|e| {
                error!(key = %key, error = %e, "Presign failed");
                ActionError::from_storage(e, FALLBACK)
            })?;

        Ok(FileUrl {
            url: presigned.url,
            key: key.to_string(),
        })
    }

    /// Delete an existing object.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, or `Storage`.
    pub async fn delete_file(&self, headers: &HeaderMap, key: &str) -> ActionResult<Deleted> {
        const FALLBACK: &str = "Failed to delete file";

        let session = self.require_session(headers).await?;
        self.require_existing(key, FALLBACK).await?;

        self.engine.delete_file(key).await.map_err(|e| {
            error!(key = %key, user_id = %session.user.id, error = %e, "Delete failed");
            ActionError::from_storage(e, FALLBACK)
        })?;

        Ok(Deleted {
            key: key.to_string(),
        })
    }

    /// Metadata of an existing object.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `NotFound`, or `Storage`.
    pub async fn get_file_meta(
        &self,
        headers: &HeaderMap,
        key: &str,
    ) -> ActionResult<ObjectMetadata> {
        const FALLBACK: &str = "Failed to get file metadata";

        self.require_session(headers).await?;
        self.require_existing(key, FALLBACK).await?;

        self.engine.file_metadata(key).await.map_err(|e| {
            error!(key = %key, error = %e, "Metadata lookup failed");
            ActionError::from_storage(e, FALLBACK)
        })
    }
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
