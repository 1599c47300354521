//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The auth collaborator contract and its JWT implementation
//! - The upload action layer
//! - A stateful upload client for interactive callers
//! - REST API routes

pub mod actions;
pub mod auth;
pub mod client;
pub mod routes;

#[cfg(test)]
mod test_support;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use actions::UploadActions;
use auth::AuthProvider;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload actions over the storage engine.
    pub actions: Arc<UploadActions>,
    /// Session lookup and sign-in flows.
    pub auth: Arc<dyn AuthProvider>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
