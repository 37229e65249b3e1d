pub mod keys;
pub mod verifier;

use serde::{Deserialize, Serialize};

pub use keys::{KeyFetcher, SigningKey, SigningKeySet};
pub use verifier::CredentialVerifier;

/// Claims carried by an identity-provider credential.
///
/// The group claim is optional on the wire: staff accounts outside any group
/// simply have no entry, which decodes as an empty list rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, alias = "cognito:groups")]
    pub groups: Vec<String>,
}

/// Verified administrator identity for one request.
///
/// Built fresh by `CredentialVerifier::verify` and injected as a request
/// extension; dropped when the request completes.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub user_id: String,
    pub email: String,
    pub groups: Vec<String>,
}

/// Why a credential was rejected. Always terminal: no auth failure is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing or invalid authorization header")]
    MissingToken,
    #[error("malformed credential: {0}")]
    MalformedToken(String),
    #[error("credential signed with unknown key '{0}'")]
    UnknownSigningKey(String),
    #[error("credential signature verification failed")]
    SignatureInvalid,
    #[error("credential has expired")]
    Expired,
    #[error("credential issuer mismatch")]
    IssuerMismatch,
    #[error("administrator access required")]
    InsufficientRole,
}

impl AuthError {
    /// 401 for identification problems, 403 when the caller is identified but
    /// lacks the administrator group.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InsufficientRole => 403,
            _ => 401,
        }
    }
}
