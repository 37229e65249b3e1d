// Administrative gateway: typed client, resilient HTTP, bulk orchestration.

pub mod admin;
pub mod bulk;
pub mod client;

pub use admin::AdminGateway;
pub use bulk::{run_bulk, BulkProgress, BulkResult, CancelFlag, FailedItem};
pub use client::{
    GatewayRequest, GatewayResponse, HttpTransport, RequestError, ResilientRequestClient,
};

use chrono::DateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed or incomplete mutation fields, caught before any network
    /// call. Never retried.
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

/// Canonical schema for a single intended state change. One definition, one
/// wire shape per action; every caller goes through this boundary, so field
/// names cannot drift between call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationRequest {
    DeleteUpload {
        user_id: String,
        uploaded_at: DateTime<Utc>,
        image_key: String,
    },
    DeleteUser {
        user_id: String,
        email: String,
    },
}

impl MutationRequest {
    pub fn action(&self) -> &'static str {
        match self {
            MutationRequest::DeleteUpload { .. } => "DELETE_UPLOAD",
            MutationRequest::DeleteUser { .. } => "DELETE_USER",
        }
    }

    pub fn method(&self) -> reqwest::Method {
        reqwest::Method::DELETE
    }

    pub fn path(&self) -> &'static str {
        match self {
            MutationRequest::DeleteUpload { .. } => "/admin/uploads",
            MutationRequest::DeleteUser { .. } => "/admin/users",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            MutationRequest::DeleteUpload { user_id, uploaded_at, image_key } => json!({
                "userId": user_id,
                "uploadedAt": uploaded_at,
                "imageKey": image_key,
            }),
            MutationRequest::DeleteUser { user_id, email } => json!({
                "userId": user_id,
                "email": email,
            }),
        }
    }

    /// Field presence check, run before any network call.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let missing = match self {
            MutationRequest::DeleteUpload { user_id, image_key, .. } => {
                if user_id.is_empty() {
                    Some("userId")
                } else if image_key.is_empty() {
                    Some("imageKey")
                } else {
                    None
                }
            }
            MutationRequest::DeleteUser { user_id, email } => {
                if user_id.is_empty() {
                    Some("userId")
                } else if email.is_empty() {
                    Some("email")
                } else {
                    None
                }
            }
        };
        match missing {
            Some(field) => Err(GatewayError::Validation(format!("missing field '{}'", field))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_user_body_uses_canonical_field_names() {
        let request = MutationRequest::DeleteUser {
            user_id: "user-42".to_string(),
            email: "ra@dorm.example.com".to_string(),
        };
        let body = request.body();
        assert_eq!(body["userId"], "user-42");
        assert_eq!(body["email"], "ra@dorm.example.com");
        assert_eq!(request.path(), "/admin/users");
    }

    #[test]
    fn empty_fields_fail_validation_before_the_wire() {
        let request = MutationRequest::DeleteUser {
            user_id: String::new(),
            email: "ra@dorm.example.com".to_string(),
        };
        assert!(matches!(request.validate(), Err(GatewayError::Validation(_))));

        let request = MutationRequest::DeleteUpload {
            user_id: "ra-1".to_string(),
            uploaded_at: Utc::now(),
            image_key: String::new(),
        };
        assert!(matches!(request.validate(), Err(GatewayError::Validation(_))));
    }
}
