//! Shared types, errors, and configuration for Stowage.
//!
//! This crate provides common types used across all other crates:
//! - Session and token types
//! - JWT signing and validation
//! - Outbound email
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;

pub use auth::{Claims, Session, TokenPurpose, User};
pub use config::{AppConfig, AuthConfig, EmailConfig, StorageSettings};
pub use email::{EmailError, EmailService, Mailer};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
