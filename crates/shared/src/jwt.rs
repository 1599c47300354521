//! JWT token generation and validation.
//!
//! Provides signed session and magic-link tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::{Claims, TokenPurpose, User};

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session token lifetime in seconds.
    pub session_ttl_secs: i64,
    /// Magic-link token lifetime in seconds.
    pub magic_link_ttl_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            session_ttl_secs: 7 * 24 * 60 * 60,
            magic_link_ttl_secs: 15 * 60,
        }
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is valid but was issued for another purpose.
    #[error("invalid token")]
    Invalid,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("session_ttl_secs", &self.config.session_ttl_secs)
            .field("magic_link_ttl_secs", &self.config.magic_link_ttl_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a token for a user and returns it with its expiry.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn issue_token(
        &self,
        user: &User,
        purpose: TokenPurpose,
    ) -> Result<(String, DateTime<Utc>), JwtError> {
        let ttl = match purpose {
            TokenPurpose::Session => self.config.session_ttl_secs,
            TokenPurpose::MagicLink => self.config.magic_link_ttl_secs,
        };
        let expires_at = Utc::now() + Duration::seconds(ttl);
        let claims = Claims::new(user, purpose, expires_at);

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;
        Ok((token, expires_at))
    }

    /// Validates a token and checks it was issued for `purpose`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::Invalid` if the token has the wrong purpose.
    /// Returns `JwtError::DecodingError` if the token is malformed.
    pub fn validate_token(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        if claims.purpose != purpose {
            return Err(JwtError::Invalid);
        }
        Ok(claims)
    }

    /// Returns the session lifetime in seconds.
    #[must_use]
    pub const fn session_ttl_secs(&self) -> i64 {
        self.config.session_ttl_secs
    }

    /// Returns the magic-link lifetime in seconds.
    #[must_use]
    pub const fn magic_link_ttl_secs(&self) -> i64 {
        self.config.magic_link_ttl_secs
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
