use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AdminPrincipal;
use crate::error::ApiError;
use crate::middleware::auth::source_ip;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::store::{NewUser, UserAccount};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
    pub email: String,
}

/// GET /admin/users - List staff accounts
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Value> {
    let users = state.users.list().await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// POST /admin/users - Create a staff account
///
/// 409 when the email is already registered.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Json(body): Json<NewUser>,
) -> ApiResult<UserAccount> {
    if body.email.is_empty() || body.first_name.is_empty() || body.last_name.is_empty() {
        return Err(ApiError::validation_error(
            "Missing required fields: email, firstName, lastName",
        ));
    }

    let account = state.users.create(body).await?;

    state
        .audit
        .record(
            "CREATE_USER",
            &principal,
            &account.user_id,
            json!({
                "email": account.email,
                "role": account.role,
            }),
            &source_ip(&headers),
        )
        .await;

    Ok(ApiResponse::created(account))
}

/// DELETE /admin/users - Delete a staff account
///
/// Administrators cannot delete their own account; the target must exist.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Json(body): Json<DeleteUserRequest>,
) -> ApiResult<Value> {
    if body.user_id.is_empty() || body.email.is_empty() {
        return Err(ApiError::validation_error(
            "Missing required fields: userId and email",
        ));
    }

    if body.user_id == principal.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if state.users.find_by_id(&body.user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let removed = state.users.delete(&body.user_id).await?;

    state
        .audit
        .record(
            "DELETE_USER",
            &principal,
            &removed.user_id,
            json!({
                "email": removed.email,
                "performedByEmail": principal.email,
            }),
            &source_ip(&headers),
        )
        .await;

    Ok(ApiResponse::success(json!({
        "message": "User deleted successfully",
        "deletedUserId": removed.user_id,
        "deletedEmail": removed.email,
    })))
}
