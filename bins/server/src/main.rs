//! Stowage API Server
//!
//! Wires the R2-backed storage engine, the JWT auth provider and the HTTP
//! routes together.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stowage_api::actions::UploadActions;
use stowage_api::auth::{AuthProvider, GoogleOAuth, JwtAuthProvider};
use stowage_api::{AppState, create_router};
use stowage_core::storage::{StorageConfig, StorageEngine};
use stowage_shared::{AppConfig, EmailService, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stowage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let storage_config = StorageConfig::from_settings(&config.storage)?;
    let engine = StorageEngine::from_config(&storage_config)?;
    info!(
        bucket = %storage_config.bucket,
        endpoint = %storage_config.endpoint(),
        public_url = ?storage_config.public_url,
        "Storage engine configured"
    );

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.auth.secret.clone(),
        session_ttl_secs: config.auth.session_ttl_secs,
        magic_link_ttl_secs: config.auth.magic_link_ttl_secs,
    });

    let email_service = EmailService::new(config.email.clone());
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let mut provider =
        JwtAuthProvider::new(jwt_service, Arc::new(email_service), &config.auth.base_url);
    let google_client_id = config
        .auth
        .google_client_id
        .clone()
        .filter(|id| !id.is_empty());
    let google_redirect_uri = config
        .auth
        .google_redirect_uri
        .clone()
        .filter(|uri| !uri.is_empty());
    match (google_client_id, google_redirect_uri) {
        (Some(client_id), Some(redirect_uri)) => {
            provider = provider.with_google(GoogleOAuth {
                client_id,
                redirect_uri,
            });
            info!("Google sign-in enabled");
        }
        (Some(_), None) => warn!("Google redirect URI missing, Google sign-in disabled"),
        _ => {}
    }
    let auth: Arc<dyn AuthProvider> = Arc::new(provider);

    let state = AppState {
        actions: Arc::new(UploadActions::new(Arc::new(engine), auth.clone())),
        auth,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
