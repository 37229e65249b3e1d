use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};

use crate::auth::{AdminPrincipal, AuthError, Claims, SigningKeySet};

/// Verifies an inbound bearer credential and gates on the administrator group.
///
/// Verification is deterministic for a fixed token and key set; the only side
/// effect is the key-set cache one layer down.
pub struct CredentialVerifier {
    keys: Arc<SigningKeySet>,
    issuer: String,
    admin_group: String,
}

impl CredentialVerifier {
    pub fn new(keys: Arc<SigningKeySet>, issuer: impl Into<String>, admin_group: impl Into<String>) -> Self {
        Self { keys, issuer: issuer.into(), admin_group: admin_group.into() }
    }

    pub async fn verify(&self, token: &str) -> Result<AdminPrincipal, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let header =
            decode_header(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::MalformedToken("missing key id in header".to_string()))?;

        let key = self.keys.resolve(&kid).await?;

        let mut validation = Validation::new(key.algorithm);
        validation.leeway = 0; // expiry is enforced exactly, not renewed here
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &key.decoding, &validation)
            .map_err(|e| classify_jwt_error(&e))?;

        self.require_admin_group(&data.claims)?;

        Ok(AdminPrincipal {
            user_id: data.claims.sub,
            email: data.claims.email,
            groups: data.claims.groups,
        })
    }

    fn require_admin_group(&self, claims: &Claims) -> Result<(), AuthError> {
        if claims.groups.iter().any(|g| g == &self.admin_group) {
            return Ok(());
        }
        // Tolerate casing drift between the issuer's group name and ours, but
        // flag it: "admins" vs "Admins" working by accident is how outages start.
        if let Some(near) = claims
            .groups
            .iter()
            .find(|g| g.eq_ignore_ascii_case(&self.admin_group))
        {
            tracing::warn!(
                subject = %claims.sub,
                "accepting group '{}' as case-insensitive match for '{}'",
                near,
                self.admin_group
            );
            return Ok(());
        }
        Err(AuthError::InsufficientRole)
    }
}

fn classify_jwt_error(err: &jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
        _ => AuthError::MalformedToken(err.to_string()),
    }
}
