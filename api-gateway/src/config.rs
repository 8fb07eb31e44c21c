//! Gateway configuration

use std::env;
use std::time::Duration;

use common::error::{Error, Result};

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listening address
    pub addr: String,
    /// Base URL of the account service
    pub account_service_url: String,
    /// Base URL of the crypto price service
    pub crypto_service_url: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Lifetime of an issued token
    pub jwt_ttl: Duration,
    /// Upper bound on a single upstream call
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    /// Configuration from environment variables. `JWT_SECRET` is required.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::ConfigurationError("JWT_SECRET is not set".to_string()))?;

        Ok(Self {
            addr: env::var("GATEWAY_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            account_service_url: env::var("ACCOUNT_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8001".to_string()),
            crypto_service_url: env::var("CRYPTO_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8002".to_string()),
            jwt_secret,
            jwt_ttl: Duration::from_secs(env_or("JWT_TTL_HOURS", 24u64) * 3600),
            upstream_timeout: Duration::from_secs(env_or("UPSTREAM_TIMEOUT_SECS", 10)),
        })
    }

    /// Configuration with explicit upstreams and secret, default timings
    pub fn new(
        account_service_url: impl Into<String>,
        crypto_service_url: impl Into<String>,
        jwt_secret: impl Into<String>,
    ) -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            account_service_url: account_service_url.into(),
            crypto_service_url: crypto_service_url.into(),
            jwt_secret: jwt_secret.into(),
            jwt_ttl: Duration::from_secs(24 * 3600),
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
