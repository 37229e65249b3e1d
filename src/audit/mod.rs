// Append-only record of destructive administrative actions.
//
// The contract that matters: `record` never raises. The mutation it
// accompanies has already succeeded or failed on its own terms, and audit-log
// unavailability must not change that outcome. A failed append is logged
// locally and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::AdminPrincipal;

/// Immutable audit entry, one per destructive action. Never updated or
/// deleted once written; reading the log back is a separate concern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub audit_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub performed_by: String,
    pub performed_by_email: String,
    pub target_id: String,
    pub details: Value,
    pub source_ip: String,
}

#[derive(Debug, thiserror::Error)]
#[error("audit append failed: {0}")]
pub struct AuditError(pub String);

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Best-effort append. Infallible to the caller.
    pub async fn record(
        &self,
        action: &str,
        principal: &AdminPrincipal,
        target_id: &str,
        details: Value,
        source_ip: &str,
    ) {
        let record = AuditRecord {
            audit_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: action.to_string(),
            performed_by: principal.user_id.clone(),
            performed_by_email: principal.email.clone(),
            target_id: target_id.to_string(),
            details,
            source_ip: source_ip.to_string(),
        };

        if let Err(err) = self.sink.append(&record).await {
            tracing::error!(
                action = %record.action,
                target = %record.target_id,
                "failed to append audit record: {}",
                err
            );
        }
    }
}

/// In-memory sink for development and tests.
#[derive(Default)]
pub struct MemoryAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
