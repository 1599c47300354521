//! Upload state for interactive callers.
//!
//! Wraps [`UploadActions`] with an `is_uploading` flag and the last error,
//! published on a `watch` channel so a UI can re-render on change.

use std::sync::Arc;

use axum::http::HeaderMap;
use tokio::sync::watch;

use stowage_core::storage::{FileContent, UploadResult};

use crate::actions::{Deleted, FileUrl, UploadActions, UploadForm};

/// Which upload action to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// General file policy.
    File,
    /// Image policy.
    Image,
}

/// Observable upload state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    /// An upload is in flight.
    pub is_uploading: bool,
    /// Message of the last failed upload.
    pub error: Option<String>,
}

/// Client-side handle over the action layer for one caller.
pub struct UploadClient {
    actions: Arc<UploadActions>,
    headers: HeaderMap,
    state: watch::Sender<UploadState>,
}

impl UploadClient {
    /// Create a client acting with the caller's request headers.
    #[must_use]
    pub fn new(actions: Arc<UploadActions>, headers: HeaderMap) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self {
            actions,
            headers,
            state,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Clear the in-flight flag and the error.
    pub fn reset(&self) {
        self.state.send_replace(UploadState::default());
    }

    /// Upload `content`, tracking progress in the state.
    ///
    /// Returns the upload result, or `None` after recording the error.
    pub async fn upload(
        &self,
        content: FileContent,
        kind: UploadKind,
        folder: Option<String>,
        is_public: bool,
    ) -> Option<UploadResult> {
        self.state.send_replace(UploadState {
            is_uploading: true,
            error: None,
        });

        let form = UploadForm {
            file: Some(content),
            folder,
            is_public,
        };
        let result = match kind {
            UploadKind::File => self.actions.upload_file(&self.headers, form).await,
            UploadKind::Image => self.actions.upload_image(&self.headers, form).await,
        };

        let error = result.as_ref().err().map(ToString::to_string);
        self.state.send_replace(UploadState {
            is_uploading: false,
            error,
        });

        result.ok()
    }

    /// Signed URL for `key`.
    ///
    /// # Errors
    ///
    /// Returns the action's error message.
    pub async fn get_file_url(&self, key: &str) -> Result<FileUrl, String> {
        self.actions
            .get_file_url(&self.headers, key)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete `key`.
    ///
    /// # Errors
    ///
    /// Returns the action's error message.
    pub async fn delete_file(&self, key: &str) -> Result<Deleted, String> {
        self.actions
            .delete_file(&self.headers, key)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StaticAuth, actions, file};

    fn client(auth: StaticAuth) -> UploadClient {
        let (_, actions) = actions(auth);
        UploadClient::new(Arc::new(actions), HeaderMap::new())
    }

    #[tokio::test]
    async fn test_successful_upload_clears_state() {
        let client = client(StaticAuth::signed_in());

        let result = client
            .upload(file(8, "a.png", "image/png"), UploadKind::Image, None, false)
            .await;

        assert!(result.is_some_and(|r| r.key.starts_with("images/")));
        assert_eq!(client.state(), UploadState::default());
    }

    #[tokio::test]
    async fn test_failed_upload_records_error() {
        let client = client(StaticAuth::signed_in());

        let result = client
            .upload(
                file(8, "a.pdf", "application/pdf"),
                UploadKind::Image,
                None,
                false,
            )
            .await;

        assert!(result.is_none());
        let state = client.state();
        assert!(!state.is_uploading);
        assert_eq!(
            state.error.as_deref(),
            Some("File type application/pdf is not allowed")
        );

        client.reset();
        assert_eq!(client.state(), UploadState::default());
    }

    #[tokio::test]
    async fn test_subscriber_sees_final_state() {
        let client = client(StaticAuth::signed_out());
        let mut rx = client.subscribe();

        client
            .upload(file(8, "a.txt", "text/plain"), UploadKind::File, None, false)
            .await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.error.as_deref(), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn test_next_upload_clears_previous_error() {
        let client = client(StaticAuth::signed_in());

        client
            .upload(file(8, "a.exe", "application/x-msdownload"), UploadKind::File, None, false)
            .await;
        assert!(client.state().error.is_some());

        client
            .upload(file(8, "a.txt", "text/plain"), UploadKind::File, None, false)
            .await;
        assert!(client.state().error.is_none());
    }

    #[tokio::test]
    async fn test_url_and_delete_unwrap_messages() {
        let client = client(StaticAuth::signed_in());

        let uploaded = client
            .upload(file(8, "a.txt", "text/plain"), UploadKind::File, Some("docs".to_string()), false)
            .await
            .expect("upload");

        let url = client.get_file_url(&uploaded.key).await.expect("url");
        assert_eq!(url.key, uploaded.key);

        client.delete_file(&uploaded.key).await.expect("delete");
        assert_eq!(
            client.get_file_url(&uploaded.key).await.unwrap_err(),
            "File not found"
        );
    }
}
