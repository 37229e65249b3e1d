// Outbound HTTP with bounded retries.
//
// The central decision here is the retryable/non-retryable split: 4xx means
// the request itself is bad and hammering the backend cannot help, while 5xx,
// timeouts, and connection failures are transient and worth a capped
// exponential backoff. Classification happens here, at the point of failure,
// from status codes and transport outcomes, never by inspecting error text
// downstream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::GatewayConfig;

/// Typed outcome of a single admin endpoint call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failure: {0}")]
    Connection(String),
    #[error("{message}")]
    Client { status: u16, message: String },
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl RequestError {
    /// Only transient failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RequestError::Timeout | RequestError::Connection(_) | RequestError::Server { .. }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Client { status, .. } | RequestError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Value,
}

/// One wire-level attempt. The real implementation rides reqwest; tests
/// script outcome sequences.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &GatewayRequest) -> Result<GatewayResponse, RequestError>;
}

/// HTTP client with per-attempt timeout and capped exponential backoff.
pub struct ResilientRequestClient {
    transport: Arc<dyn HttpTransport>,
    config: GatewayConfig,
}

impl ResilientRequestClient {
    pub fn new(transport: Arc<dyn HttpTransport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    /// Build a client on a plain reqwest transport.
    pub fn with_reqwest(config: GatewayConfig) -> Self {
        Self::new(Arc::new(ReqwestTransport::new()), config)
    }

    pub async fn send(&self, request: GatewayRequest) -> Result<GatewayResponse, RequestError> {
        let attempts = self.config.max_retry_attempts.max(1);
        let mut last_error = RequestError::Connection("no attempt made".to_string());

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = backoff_delay(&self.config, attempt - 1);
                tracing::debug!(
                    url = %request.url,
                    attempt = attempt + 1,
                    "retrying after {:?}: {}",
                    delay,
                    last_error
                );
                tokio::time::sleep(delay).await;
            }

            let per_attempt = Duration::from_millis(self.config.request_timeout_ms);
            let outcome = match tokio::time::timeout(per_attempt, self.transport.execute(&request))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(RequestError::Timeout),
            };

            match outcome {
                Ok(response) if (200..300).contains(&response.status) => return Ok(response),
                Ok(response) if (400..500).contains(&response.status) => {
                    return Err(RequestError::Client {
                        status: response.status,
                        message: backend_message(&response),
                    });
                }
                Ok(response) => {
                    last_error = RequestError::Server {
                        status: response.status,
                        message: backend_message(&response),
                    };
                }
                Err(err) if err.is_retryable() => last_error = err,
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }
}

/// Delay doubles per attempt from the configured base, capped.
fn backoff_delay(config: &GatewayConfig, attempt: u32) -> Duration {
    let exp = config
        .backoff_base_ms
        .saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(exp.min(config.backoff_cap_ms))
}

/// Prefer the backend-supplied message over a classified default.
fn backend_message(response: &GatewayResponse) -> String {
    response
        .body
        .get("message")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("server returned {}", response.status))
}

/// Plain reqwest transport. The per-attempt timeout lives in the client loop,
/// so the inner reqwest client carries none of its own.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &GatewayRequest) -> Result<GatewayResponse, RequestError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RequestError::Timeout
            } else {
                RequestError::Connection(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        // Bodies are informative only; an unreadable one never fails the call
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(GatewayResponse { status, body })
    }
}
