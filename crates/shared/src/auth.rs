//! Authentication types for sessions and sign-in requests.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a signed token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Long-lived session token carried in the session cookie.
    Session,
    /// Short-lived token embedded in a magic-link email.
    MagicLink,
}

/// JWT claims shared by session and magic-link tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Unique token ID, used to revoke a single token.
    pub jti: Uuid,
    /// Email address the token was issued for.
    pub email: String,
    /// Token purpose.
    pub purpose: TokenPurpose,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user: &User, purpose: TokenPurpose, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            jti: Uuid::new_v4(),
            email: user.email.clone(),
            purpose,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user these claims were issued for.
    #[must_use]
    pub fn user(&self) -> User {
        User {
            id: self.sub,
            email: self.email.clone(),
        }
    }

    /// Returns the expiration as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user ID derived from the email address.
    pub id: Uuid,
    /// User email.
    pub email: String,
}

impl User {
    /// Builds the user identity for an email address.
    ///
    /// The ID is a name-based UUID, so the same address always maps to
    /// the same user without a user table.
    #[must_use]
    pub fn from_email(email: &str) -> Self {
        let email = email.trim().to_lowercase();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{email}").as_bytes());
        Self { id, email }
    }
}

/// A resolved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in user.
    pub user: User,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Magic-link sign-in request.
#[derive(Debug, Clone, Deserialize)]
pub struct MagicLinkRequest {
    /// Email address to send the link to.
    pub email: String,
}

/// Query string of a magic-link verification request.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyMagicLinkQuery {
    /// The token from the email link.
    pub token: String,
}

/// Social sign-in request.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialSignInRequest {
    /// Provider name, e.g. `google`.
    pub provider: String,
}

/// Social sign-in response: where the browser should go next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialSignInResponse {
    /// Provider authorization URL.
    pub url: String,
    /// Whether the client should redirect.
    pub redirect: bool,
}
