use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AdminPrincipal, AuthError};
use crate::error::ApiError;

/// Gate for the administrative routes: verifies the bearer credential and
/// injects the resulting principal into the request.
///
/// Verification failures short-circuit here; no handler, and therefore no
/// mutation, runs for a rejected credential.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_from_headers(&headers)?;
    let principal: AdminPrincipal = state.verifier.verify(&token).await?;

    tracing::debug!(admin = %principal.email, "admin verified");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract the bearer credential from the Authorization header
fn extract_bearer_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or(AuthError::MissingToken)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::MissingToken)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err(AuthError::MissingToken),
    }
}

/// Best-effort caller network origin for the audit trail.
pub fn source_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
