//! Auth collaborator: session lookup and sign-in flows.
//!
//! The upload actions only ever call [`AuthProvider::get_session`]; the
//! sign-in methods back the `/auth` routes.

mod provider;

use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;

use stowage_shared::auth::SocialSignInResponse;
use stowage_shared::{EmailError, JwtError, Session};

pub use provider::{GoogleOAuth, JwtAuthProvider};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "stowage_session";

/// Auth errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email address is not valid.
    #[error("Invalid email address")]
    InvalidEmail,

    /// No such social provider.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The provider exists but has no client credentials configured.
    #[error("Provider {0} is not configured")]
    ProviderNotConfigured(String),

    /// Magic-link token is invalid or expired.
    #[error("Invalid or expired sign-in link")]
    InvalidLink,

    /// Email delivery failed.
    #[error("Failed to send magic link")]
    Email(#[from] EmailError),

    /// Token signing failed.
    #[error("Failed to issue session")]
    Token(#[from] JwtError),
}

/// A freshly issued session and the token that carries it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Signed session token for the session cookie.
    pub token: String,
    /// The session it represents.
    pub session: Session,
}

/// The auth collaborator contract.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the caller's session from request headers.
    ///
    /// Missing, expired or forged credentials resolve to `Ok(None)`.
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError>;

    /// Email a sign-in link to `email`.
    async fn sign_in_magic_link(&self, email: &str) -> Result<(), AuthError>;

    /// Exchange the token from a magic link for a session.
    async fn complete_magic_link(&self, token: &str) -> Result<IssuedSession, AuthError>;

    /// Start an OAuth sign-in with `provider`.
    async fn sign_in_social(&self, provider: &str) -> Result<SocialSignInResponse, AuthError>;

    /// End the caller's session.
    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AuthError>;
}

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Session token from the Authorization header, else the session cookie.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("stowage_session=from-cookie"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; stowage_session=from-cookie"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_no_credentials() {
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
