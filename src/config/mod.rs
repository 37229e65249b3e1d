use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub cors_origins: Vec<String>,
    pub max_request_size_bytes: usize,
}

/// Credential verification settings: issuer identity, key discovery, and the
/// group a caller must carry for destructive admin actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub issuer: String,
    pub jwks_url: String,
    pub admin_group: String,
    pub key_ttl_secs: u64,
}

/// Retry/timeout policy for outbound admin mutation calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub request_timeout_ms: u64,
    pub max_retry_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ISSUER") {
            self.security.issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_JWKS_URL") {
            self.security.jwks_url = v;
        }
        if let Ok(v) = env::var("SECURITY_ADMIN_GROUP") {
            self.security.admin_group = v;
        }
        if let Ok(v) = env::var("SECURITY_KEY_TTL_SECS") {
            self.security.key_ttl_secs = v.parse().unwrap_or(self.security.key_ttl_secs);
        }

        // Gateway overrides
        if let Ok(v) = env::var("GATEWAY_REQUEST_TIMEOUT_MS") {
            self.gateway.request_timeout_ms = v.parse().unwrap_or(self.gateway.request_timeout_ms);
        }
        if let Ok(v) = env::var("GATEWAY_MAX_RETRY_ATTEMPTS") {
            self.gateway.max_retry_attempts = v.parse().unwrap_or(self.gateway.max_retry_attempts);
        }
        if let Ok(v) = env::var("GATEWAY_BACKOFF_BASE_MS") {
            self.gateway.backoff_base_ms = v.parse().unwrap_or(self.gateway.backoff_base_ms);
        }
        if let Ok(v) = env::var("GATEWAY_BACKOFF_CAP_MS") {
            self.gateway.backoff_cap_ms = v.parse().unwrap_or(self.gateway.backoff_cap_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                enable_request_logging: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                max_request_size_bytes: 10 * 1024 * 1024, // room photos ride the JSON body
            },
            security: SecurityConfig {
                issuer: "http://localhost:9090/issuer".to_string(),
                jwks_url: "http://localhost:9090/issuer/.well-known/jwks.json".to_string(),
                admin_group: "Admins".to_string(),
                key_ttl_secs: 600,
            },
            gateway: GatewayConfig {
                request_timeout_ms: 30_000,
                max_retry_attempts: 3,
                backoff_base_ms: 1_000,
                backoff_cap_ms: 10_000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                enable_request_logging: true,
                cors_origins: vec!["https://staging.roomcheck.example.com".to_string()],
                max_request_size_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                issuer: "https://id.staging.roomcheck.example.com".to_string(),
                jwks_url: "https://id.staging.roomcheck.example.com/.well-known/jwks.json"
                    .to_string(),
                admin_group: "Admins".to_string(),
                key_ttl_secs: 600,
            },
            gateway: GatewayConfig {
                request_timeout_ms: 30_000,
                max_retry_attempts: 3,
                backoff_base_ms: 1_000,
                backoff_cap_ms: 10_000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                enable_request_logging: false,
                cors_origins: vec!["https://roomcheck.example.com".to_string()],
                max_request_size_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                issuer: "https://id.roomcheck.example.com".to_string(),
                jwks_url: "https://id.roomcheck.example.com/.well-known/jwks.json".to_string(),
                admin_group: "Admins".to_string(),
                key_ttl_secs: 600,
            },
            gateway: GatewayConfig {
                request_timeout_ms: 15_000,
                max_retry_attempts: 3,
                backoff_base_ms: 1_000,
                backoff_cap_ms: 10_000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
