use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::AdminPrincipal;
use crate::error::ApiError;
use crate::middleware::auth::source_ip;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUploadRequest {
    pub user_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub image_key: String,
}

/// GET /admin/uploads - List all room-inspection uploads
pub async fn list_uploads(State(state): State<AppState>) -> ApiResult<Value> {
    let items = state.uploads.list().await?;
    Ok(ApiResponse::success(json!({ "items": items })))
}

/// DELETE /admin/uploads - Delete a single upload by (uploader, timestamp) key
///
/// 404 when the upload is gone already; the bulk client surfaces that per
/// item rather than aborting the batch.
pub async fn delete_upload(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    headers: HeaderMap,
    Json(body): Json<DeleteUploadRequest>,
) -> ApiResult<Value> {
    if body.user_id.is_empty() || body.image_key.is_empty() {
        return Err(ApiError::validation_error(
            "Missing required fields: userId and imageKey",
        ));
    }

    let removed = state.uploads.delete(&body.user_id, &body.uploaded_at).await?;

    state
        .audit
        .record(
            "DELETE_UPLOAD",
            &principal,
            &removed.image_key,
            json!({
                "uploadedByUserId": removed.uploaded_by_user_id,
                "uploadedAt": removed.uploaded_at,
                "dorm": removed.dorm,
                "room": removed.room,
            }),
            &source_ip(&headers),
        )
        .await;

    Ok(ApiResponse::success(json!({
        "message": "Upload deleted successfully",
        "deletedImageKey": removed.image_key,
    })))
}
