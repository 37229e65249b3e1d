// Typed client for the admin endpoints: the UI layer's single entry point
// into the gateway. Every call attaches the caller's bearer credential;
// mutation bodies come from the canonical MutationRequest schema.

use serde_json::Value;

use crate::config::GatewayConfig;
use crate::gateway::bulk::{run_bulk, BulkProgress, BulkResult, CancelFlag};
use crate::gateway::client::{GatewayRequest, ResilientRequestClient};
use crate::gateway::{GatewayError, MutationRequest};
use crate::store::{NewUser, Upload, UserAccount};

pub struct AdminGateway {
    base_url: String,
    bearer: String,
    client: ResilientRequestClient,
}

impl AdminGateway {
    pub fn new(
        base_url: impl Into<String>,
        bearer: impl Into<String>,
        client: ResilientRequestClient,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, bearer: bearer.into(), client }
    }

    /// Convenience constructor on the plain reqwest transport.
    pub fn connect(
        base_url: impl Into<String>,
        bearer: impl Into<String>,
        config: GatewayConfig,
    ) -> Self {
        Self::new(base_url, bearer, ResilientRequestClient::with_reqwest(config))
    }

    /// Execute one mutation: validate fields, then call the backend with
    /// retry/backoff handled a layer down. Returns the response body.
    pub async fn execute(&self, request: &MutationRequest) -> Result<Value, GatewayError> {
        request.validate()?;
        let response = self
            .client
            .send(GatewayRequest {
                method: request.method(),
                url: format!("{}{}", self.base_url, request.path()),
                bearer: Some(self.bearer.clone()),
                body: Some(request.body()),
            })
            .await?;
        Ok(response.body)
    }

    /// Run many mutations sequentially with per-item failure capture and a
    /// progress callback after each item. Batch-level retry does not exist;
    /// per-item retry already happened inside the request client.
    pub async fn bulk_execute<P>(
        &self,
        items: Vec<MutationRequest>,
        on_progress: P,
        cancel: &CancelFlag,
    ) -> BulkResult<MutationRequest>
    where
        P: FnMut(BulkProgress),
    {
        run_bulk(items, |item| async move { self.execute(&item).await }, on_progress, cancel)
            .await
    }

    /// Delete every given upload, one call at a time.
    pub async fn bulk_delete_uploads<P>(
        &self,
        uploads: &[Upload],
        on_progress: P,
        cancel: &CancelFlag,
    ) -> BulkResult<MutationRequest>
    where
        P: FnMut(BulkProgress),
    {
        let items = uploads
            .iter()
            .map(|u| MutationRequest::DeleteUpload {
                user_id: u.uploaded_by_user_id.clone(),
                uploaded_at: u.uploaded_at,
                image_key: u.image_key.clone(),
            })
            .collect();
        self.bulk_execute(items, on_progress, cancel).await
    }

    pub async fn delete_upload(&self, upload: &Upload) -> Result<Value, GatewayError> {
        self.execute(&MutationRequest::DeleteUpload {
            user_id: upload.uploaded_by_user_id.clone(),
            uploaded_at: upload.uploaded_at,
            image_key: upload.image_key.clone(),
        })
        .await
    }

    pub async fn delete_user(&self, user_id: &str, email: &str) -> Result<Value, GatewayError> {
        self.execute(&MutationRequest::DeleteUser {
            user_id: user_id.to_string(),
            email: email.to_string(),
        })
        .await
    }

    pub async fn list_uploads(&self) -> Result<Vec<Upload>, GatewayError> {
        let body = self.get("/admin/uploads").await?;
        parse_data(&body, "items")
    }

    pub async fn list_users(&self) -> Result<Vec<UserAccount>, GatewayError> {
        let body = self.get("/admin/users").await?;
        parse_data(&body, "users")
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<UserAccount, GatewayError> {
        // Same field set the backend's 400 check enforces
        let missing = if user.email.is_empty() {
            Some("email")
        } else if user.first_name.is_empty() {
            Some("firstName")
        } else if user.last_name.is_empty() {
            Some("lastName")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(GatewayError::Validation(format!("missing field '{}'", field)));
        }
        let response = self
            .client
            .send(GatewayRequest {
                method: reqwest::Method::POST,
                url: format!("{}/admin/users", self.base_url),
                bearer: Some(self.bearer.clone()),
                body: Some(serde_json::to_value(user).unwrap_or(Value::Null)),
            })
            .await?;
        serde_json::from_value(response.body.get("data").cloned().unwrap_or(Value::Null))
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))
    }

    pub async fn health(&self) -> bool {
        self.get("/health").await.is_ok()
    }

    async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        let response = self
            .client
            .send(GatewayRequest {
                method: reqwest::Method::GET,
                url: format!("{}{}", self.base_url, path),
                bearer: Some(self.bearer.clone()),
                body: None,
            })
            .await?;
        Ok(response.body)
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(
    body: &Value,
    key: &str,
) -> Result<Vec<T>, GatewayError> {
    let items = body
        .get("data")
        .and_then(|d| d.get(key))
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    serde_json::from_value(items).map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))
}
