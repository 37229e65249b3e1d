use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::audit::AuditRecorder;
use crate::auth::CredentialVerifier;
use crate::config::{config, ApiConfig};
use crate::handlers::admin;
use crate::middleware::admin_auth_middleware;
use crate::store::{UploadStore, UserDirectory};

/// Everything a request handler needs, wired once at startup. Trait objects
/// at the seams let tests substitute in-memory collaborators.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CredentialVerifier>,
    pub uploads: Arc<dyn UploadStore>,
    pub users: Arc<dyn UserDirectory>,
    pub audit: Arc<AuditRecorder>,
}

pub fn app(state: AppState) -> Router {
    let api = &config().api;

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Admin routes behind credential verification
        .merge(admin_routes(state.clone()))
        // Global middleware
        .layer(cors_layer(api))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .with_state(state);

    if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Browsers only get CORS approval for the configured origins. A literal "*"
/// entry opts into the fully permissive layer.
fn cors_layer(api: &ApiConfig) -> CorsLayer {
    if api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/uploads",
            get(admin::list_uploads).delete(admin::delete_upload),
        )
        .route(
            "/admin/users",
            get(admin::list_users)
                .post(admin::create_user)
                .delete(admin::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "RoomCheck API",
            "version": version,
            "description": "Dormitory room-inspection reporting backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "uploads": "/admin/uploads (admin - list, delete)",
                "users": "/admin/users (admin - list, create, delete)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
