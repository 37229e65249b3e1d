// Rotating public-key set for credential verification.
//
// Keys come from the issuer's JWKS discovery endpoint and are cached with a
// TTL. A lookup miss triggers exactly one refresh before failing; concurrent
// lookups share the in-flight refresh instead of issuing duplicate fetches,
// and a stale-but-present key is served rather than blocking verification on
// a refresh another task already started.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::auth::AuthError;

/// One verification key resolved from the discovery document.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub algorithm: Algorithm,
    pub decoding: DecodingKey,
}

// DecodingKey holds raw key material and offers no Debug of its own
impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("signing key fetch failed: {0}")]
pub struct KeyFetchError(pub String);

/// Source of the current key set. The HTTP implementation hits the issuer's
/// well-known JWKS URL; tests substitute scripted fetchers.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<SigningKey>, KeyFetchError>;
}

struct CacheState {
    keys: HashMap<String, SigningKey>,
    fetched_at: Option<Instant>,
}

/// TTL-bounded kid → key cache with single-flight refresh.
pub struct SigningKeySet {
    fetcher: Arc<dyn KeyFetcher>,
    ttl: Duration,
    state: RwLock<CacheState>,
    refresh: Mutex<()>,
}

impl SigningKeySet {
    pub fn new(fetcher: Arc<dyn KeyFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            state: RwLock::new(CacheState { keys: HashMap::new(), fetched_at: None }),
            refresh: Mutex::new(()),
        }
    }

    /// Resolve a key identifier to verification key material.
    ///
    /// Fresh hit: returned directly. Stale hit: served as-is if a refresh is
    /// already in flight, otherwise refreshed first. Miss: one refresh, then
    /// `UnknownSigningKey` if the identifier is still absent.
    pub async fn resolve(&self, kid: &str) -> Result<SigningKey, AuthError> {
        let (cached, fresh) = {
            let state = self.state.read().await;
            let fresh = state
                .fetched_at
                .map(|at| at.elapsed() < self.ttl)
                .unwrap_or(false);
            (state.keys.get(kid).cloned(), fresh)
        };

        match cached {
            Some(key) if fresh => Ok(key),
            Some(key) => {
                // Stale entry: refresh unless another task already is, in
                // which case the stale key is still good enough to verify with.
                match self.refresh.try_lock() {
                    Ok(_guard) => {
                        if let Err(e) = self.refresh_keys().await {
                            tracing::warn!("key refresh failed, serving stale key: {}", e);
                            return Ok(key);
                        }
                        self.lookup(kid)
                            .await
                            .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_string()))
                    }
                    Err(_) => Ok(key),
                }
            }
            None => {
                let _guard = self.refresh.lock().await;
                // Another task may have refreshed while this one waited.
                if let Some(key) = self.lookup(kid).await {
                    return Ok(key);
                }
                if let Err(e) = self.refresh_keys().await {
                    tracing::warn!("key refresh failed: {}", e);
                    return Err(AuthError::UnknownSigningKey(kid.to_string()));
                }
                self.lookup(kid)
                    .await
                    .ok_or_else(|| AuthError::UnknownSigningKey(kid.to_string()))
            }
        }
    }

    async fn lookup(&self, kid: &str) -> Option<SigningKey> {
        let state = self.state.read().await;
        let fresh = state
            .fetched_at
            .map(|at| at.elapsed() < self.ttl)
            .unwrap_or(false);
        if fresh {
            state.keys.get(kid).cloned()
        } else {
            None
        }
    }

    async fn refresh_keys(&self) -> Result<(), KeyFetchError> {
        let keys = self.fetcher.fetch().await?;
        let mut state = self.state.write().await;
        state.keys = keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
        state.fetched_at = Some(Instant::now());
        tracing::debug!("signing key set refreshed, {} keys", state.keys.len());
        Ok(())
    }
}

// --- JWKS discovery document ------------------------------------------------

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Fetches the key set from the issuer's well-known JWKS endpoint.
pub struct HttpKeyFetcher {
    client: reqwest::Client,
    jwks_url: String,
}

impl HttpKeyFetcher {
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), jwks_url: jwks_url.into() }
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self) -> Result<Vec<SigningKey>, KeyFetchError> {
        let doc: JwksDocument = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| KeyFetchError(e.to_string()))?
            .error_for_status()
            .map_err(|e| KeyFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| KeyFetchError(e.to_string()))?;

        let mut keys = Vec::new();
        for jwk in doc.keys {
            if jwk.kty != "RSA" {
                tracing::debug!("skipping non-RSA key '{}' in JWKS", jwk.kid);
                continue;
            }
            let (n, e) = match (&jwk.n, &jwk.e) {
                (Some(n), Some(e)) => (n, e),
                _ => {
                    tracing::warn!("RSA key '{}' missing modulus/exponent", jwk.kid);
                    continue;
                }
            };
            let decoding = DecodingKey::from_rsa_components(n, e)
                .map_err(|e| KeyFetchError(format!("invalid RSA key '{}': {}", jwk.kid, e)))?;
            let algorithm = match jwk.alg.as_deref() {
                Some("RS384") => Algorithm::RS384,
                Some("RS512") => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            keys.push(SigningKey { kid: jwk.kid, algorithm, decoding });
        }
        Ok(keys)
    }
}
