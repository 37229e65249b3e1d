use std::sync::Arc;
use std::time::Duration;

use roomcheck_api::app::{app, AppState};
use roomcheck_api::audit::{AuditRecorder, MemoryAuditLog};
use roomcheck_api::auth::keys::HttpKeyFetcher;
use roomcheck_api::auth::{CredentialVerifier, SigningKeySet};
use roomcheck_api::config;
use roomcheck_api::store::{MemoryUploadStore, MemoryUserDirectory};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up SECURITY_JWKS_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting RoomCheck API in {:?} mode", config.environment);

    let keys = Arc::new(SigningKeySet::new(
        Arc::new(HttpKeyFetcher::new(config.security.jwks_url.clone())),
        Duration::from_secs(config.security.key_ttl_secs),
    ));
    let verifier = Arc::new(CredentialVerifier::new(
        keys,
        config.security.issuer.clone(),
        config.security.admin_group.clone(),
    ));

    let state = AppState {
        verifier,
        uploads: Arc::new(MemoryUploadStore::new()),
        users: Arc::new(MemoryUserDirectory::new()),
        audit: Arc::new(AuditRecorder::new(Arc::new(MemoryAuditLog::new()))),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("ROOMCHECK_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("RoomCheck API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
