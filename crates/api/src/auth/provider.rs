//! JWT-backed auth provider with magic-link email and Google redirect.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use moka::sync::Cache;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stowage_shared::auth::{Claims, SocialSignInResponse};
use stowage_shared::email::{MAGIC_LINK_SUBJECT, is_valid_address, magic_link_body};
use stowage_shared::{JwtService, Mailer, Session, TokenPurpose, User};

use super::{AuthError, AuthProvider, IssuedSession, session_token};

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Upper bound on remembered token ids per denylist.
const DENYLIST_CAPACITY: u64 = 100_000;

/// Google OAuth client settings.
///
/// The authorization code exchange and the `state` check happen at
/// `redirect_uri`, which is served outside this crate.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    /// OAuth client ID.
    pub client_id: String,
    /// Registered callback that receives the authorization code.
    pub redirect_uri: String,
}

/// Signed sessions with in-memory denylists.
///
/// Token ids of consumed magic links and signed-out sessions are kept
/// until the token would have expired anyway, so a link works once and a
/// signed-out token stops resolving. The lists live in this process only.
pub struct JwtAuthProvider {
    jwt: JwtService,
    mailer: Arc<dyn Mailer>,
    base_url: String,
    google: Option<GoogleOAuth>,
    consumed_links: Cache<Uuid, ()>,
    revoked_sessions: Cache<Uuid, ()>,
}

fn denylist(ttl_secs: i64) -> Cache<Uuid, ()> {
    let ttl = u64::try_from(ttl_secs).unwrap_or(0).max(1);
    Cache::builder()
        .max_capacity(DENYLIST_CAPACITY)
        .time_to_live(Duration::from_secs(ttl))
        .build()
}

impl JwtAuthProvider {
    /// Create a provider. `base_url` is this service's public origin.
    #[must_use]
    pub fn new(jwt: JwtService, mailer: Arc<dyn Mailer>, base_url: impl Into<String>) -> Self {
        Self {
            consumed_links: denylist(jwt.magic_link_ttl_secs()),
            revoked_sessions: denylist(jwt.session_ttl_secs()),
            jwt,
            mailer,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            google: None,
        }
    }

    /// Enable Google sign-in.
    #[must_use]
    pub fn with_google(mut self, google: GoogleOAuth) -> Self {
        self.google = Some(google);
        self
    }

    fn magic_link_url(&self, token: &str) -> String {
        format!("{}/api/v1/auth/magic-link/verify?token={token}", self.base_url)
    }

    fn session_claims(&self, headers: &HeaderMap) -> Option<Claims> {
        let token = session_token(headers)?;
        match self.jwt.validate_token(&token, TokenPurpose::Session) {
            Ok(claims) if self.revoked_sessions.contains_key(&claims.jti) => {
                debug!(user_id = %claims.sub, "Rejected signed-out session");
                None
            }
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    fn google_redirect(google: &GoogleOAuth) -> Result<String, AuthError> {
        let state = Uuid::new_v4().to_string();
        let query = serde_urlencoded::to_string([
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state.as_str()),
        ])
        .map_err(|_| AuthError::ProviderNotConfigured("google".to_string()))?;

        Ok(format!("{GOOGLE_AUTHORIZE_URL}?{query}"))
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        Ok(self.session_claims(headers).map(|claims| Session {
            user: claims.user(),
            expires_at: claims.expires_at(),
        }))
    }

    async fn sign_in_magic_link(&self, email: &str) -> Result<(), AuthError> {
        if !is_valid_address(email.trim()) {
            return Err(AuthError::InvalidEmail);
        }

        let user = User::from_email(email);
        let (token, _) = self.jwt.issue_token(&user, TokenPurpose::MagicLink)?;
        let body = magic_link_body(
            &self.magic_link_url(&token),
            self.jwt.magic_link_ttl_secs(),
        );

        self.mailer
            .send_email(&user.email, MAGIC_LINK_SUBJECT, &body)
            .await?;

        info!(user_id = %user.id, "Magic link sent");
        Ok(())
    }

    async fn complete_magic_link(&self, token: &str) -> Result<IssuedSession, AuthError> {
        let claims = self
            .jwt
            .validate_token(token, TokenPurpose::MagicLink)
            .map_err(|_| AuthError::InvalidLink)?;

        if !self.consumed_links.entry(claims.jti).or_insert(()).is_fresh() {
            warn!(user_id = %claims.sub, "Magic link reused");
            return Err(AuthError::InvalidLink);
        }

        let user = claims.user();
        let (token, expires_at) = self.jwt.issue_token(&user, TokenPurpose::Session)?;

        info!(user_id = %user.id, "Signed in with magic link");
        Ok(IssuedSession {
            token,
            session: Session { user, expires_at },
        })
    }

    async fn sign_in_social(&self, provider: &str) -> Result<SocialSignInResponse, AuthError> {
        match provider {
            "google" => {
                let google = self
                    .google
                    .as_ref()
                    .ok_or_else(|| AuthError::ProviderNotConfigured(provider.to_string()))?;
                Ok(SocialSignInResponse {
                    url: Self::google_redirect(google)?,
                    redirect: true,
                })
            }
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        if let Some(claims) = self.session_claims(headers) {
            self.revoked_sessions.insert(claims.jti, ());
            info!(user_id = %claims.sub, "Signed out");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
