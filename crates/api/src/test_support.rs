//! Fixtures shared by the api crate's tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};

use stowage_core::storage::memory::MemoryStore;
use stowage_core::storage::{FileContent, StorageConfig, StorageEngine};
use stowage_shared::auth::SocialSignInResponse;
use stowage_shared::{Session, User};

use crate::actions::UploadActions;
use crate::auth::{AuthError, AuthProvider, IssuedSession};

/// Auth stub that always returns the same session.
///
/// When signed in, the magic-link token `valid-link` completes to that
/// session with the token `session-token`.
pub struct StaticAuth(pub Option<Session>);

impl StaticAuth {
    pub fn signed_in() -> Self {
        Self(Some(Session {
            user: User::from_email("ada@example.com"),
            expires_at: Utc::now() + Duration::hours(1),
        }))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn get_session(&self, _headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        Ok(self.0.clone())
    }

    async fn sign_in_magic_link(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn complete_magic_link(&self, token: &str) -> Result<IssuedSession, AuthError> {
        match &self.0 {
            Some(session) if token == "valid-link" => Ok(IssuedSession {
                token: "session-token".to_string(),
                session: session.clone(),
            }),
            _ => Err(AuthError::InvalidLink),
        }
    }

    async fn sign_in_social(&self, provider: &str) -> Result<SocialSignInResponse, AuthError> {
        Err(AuthError::UnsupportedProvider(provider.to_string()))
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<(), AuthError> {
        Ok(())
    }
}

pub fn engine(store: Arc<MemoryStore>) -> Arc<StorageEngine> {
    let config = StorageConfig::new("acct", "access", "secret", "uploads", None)
        .expect("valid config");
    Arc::new(StorageEngine::new(store, &config))
}

pub fn actions(auth: StaticAuth) -> (Arc<MemoryStore>, UploadActions) {
    let store = Arc::new(MemoryStore::new());
    let actions = UploadActions::new(engine(store.clone()), Arc::new(auth));
    (store, actions)
}

pub fn file(len: usize, name: &str, content_type: &str) -> FileContent {
    FileContent::new(vec![1u8; len], name, content_type)
}

pub fn state(auth: StaticAuth) -> (Arc<MemoryStore>, crate::AppState) {
    let auth: Arc<dyn AuthProvider> = Arc::new(auth);
    let store = Arc::new(MemoryStore::new());
    let actions = UploadActions::new(engine(store.clone()), auth.clone());
    let state = crate::AppState {
        actions: Arc::new(actions),
        auth,
    };
    (store, state)
}
