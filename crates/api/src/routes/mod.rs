//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod auth;
pub mod health;
pub mod storage;

/// Creates the API router with all routes.
///
/// Storage routes check the session themselves through the action layer,
/// so no auth middleware is layered here.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(storage::routes())
}
