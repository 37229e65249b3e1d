// Shared harness: an in-process server on an ephemeral port, with in-memory
// collaborators the tests can inspect directly, and helpers for minting
// credentials against a static signing key.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};

use roomcheck_api::app::{app, AppState};
use roomcheck_api::audit::{AuditRecorder, MemoryAuditLog};
use roomcheck_api::auth::keys::{KeyFetchError, KeyFetcher, SigningKey};
use roomcheck_api::auth::{Claims, CredentialVerifier, SigningKeySet};
use roomcheck_api::store::{MemoryUploadStore, MemoryUserDirectory, Upload, UserAccount};

pub const SECRET: &[u8] = b"integration-test-secret";
pub const ISSUER: &str = "https://id.test.example.com";
pub const KID: &str = "test-key";

pub struct TestServer {
    pub base_url: String,
    pub uploads: Arc<MemoryUploadStore>,
    pub users: Arc<MemoryUserDirectory>,
    pub audit_log: Arc<MemoryAuditLog>,
}

struct StaticFetcher;

#[async_trait::async_trait]
impl KeyFetcher for StaticFetcher {
    async fn fetch(&self) -> Result<Vec<SigningKey>, KeyFetchError> {
        Ok(vec![SigningKey {
            kid: KID.to_string(),
            algorithm: Algorithm::HS256,
            decoding: DecodingKey::from_secret(SECRET),
        }])
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    let keys = Arc::new(SigningKeySet::new(Arc::new(StaticFetcher), Duration::from_secs(300)));
    let verifier = Arc::new(CredentialVerifier::new(keys, ISSUER, "Admins"));

    let uploads = Arc::new(MemoryUploadStore::new());
    let users = Arc::new(MemoryUserDirectory::new());
    let audit_log = Arc::new(MemoryAuditLog::new());

    let state = AppState {
        verifier,
        uploads: uploads.clone(),
        users: users.clone(),
        audit: Arc::new(AuditRecorder::new(audit_log.clone())),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.expect("test server");
    });

    Ok(TestServer { base_url: format!("http://{}", addr), uploads, users, audit_log })
}

pub fn mint_token(sub: &str, groups: Vec<&str>, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        email: format!("{}@dorm.example.com", sub),
        iss: ISSUER.to_string(),
        exp: now + exp_offset_secs,
        iat: now,
        groups: groups.into_iter().map(String::from).collect(),
    };
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).expect("mint token")
}

pub fn admin_token() -> String {
    mint_token("admin-1", vec!["Admins"], 3600)
}

pub fn sample_upload(user_id: &str, uploaded_at: DateTime<Utc>) -> Upload {
    Upload {
        uploaded_by_user_id: user_id.to_string(),
        uploaded_at,
        image_key: format!("uploads/{}/{}.jpg", user_id, uploaded_at.timestamp()),
        dorm: "North Hall".to_string(),
        room: "214".to_string(),
        notes: String::new(),
        uploaded_by_name: "RA Jordan".to_string(),
        resident_name: "Casey Resident".to_string(),
        resident_j_number: "J00123456".to_string(),
        resident_email: "casey@dorm.example.com".to_string(),
        inspection_status: "pass".to_string(),
        maintenance_issues: vec![],
        failure_reasons: vec![],
    }
}

pub fn sample_user(user_id: &str, email: &str) -> UserAccount {
    UserAccount {
        user_id: user_id.to_string(),
        email: email.to_string(),
        first_name: "Jordan".to_string(),
        last_name: "Lee".to_string(),
        role: "RA".to_string(),
        created_at: Utc::now(),
    }
}
