//! Configuration for the crypto price service

use std::env;
use std::time::Duration;

use common::error::{Error, Result};

/// Public CryptoCompare API host
pub const CRYPTOCOMPARE_URL: &str = "https://min-api.cryptocompare.com";

/// Configuration for the crypto price service
#[derive(Debug, Clone)]
pub struct CryptoServiceConfig {
    /// Listening address
    pub addr: String,
    /// CryptoCompare API key
    pub api_key: String,
    /// Sent to CryptoCompare as `extraParams`
    pub app_name: String,
    /// CryptoCompare base URL
    pub base_url: String,
    /// Upper bound on one provider request
    pub provider_timeout: Duration,
}

impl CryptoServiceConfig {
    /// Read the configuration from environment variables.
    /// `CRYPTOCOMPARE_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("CRYPTOCOMPARE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::ConfigurationError("CRYPTOCOMPARE_API_KEY must be set".to_string()))?;

        let provider_timeout = env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            addr: env::var("CRYPTO_ADDR").unwrap_or_else(|_| "127.0.0.1:8002".to_string()),
            api_key,
            app_name: env::var("CRYPTOCOMPARE_APP_NAME").unwrap_or_else(|_| "crypto-app".to_string()),
            base_url: env::var("CRYPTOCOMPARE_URL").unwrap_or_else(|_| CRYPTOCOMPARE_URL.to_string()),
            provider_timeout: Duration::from_secs(provider_timeout),
        })
    }

    /// Configuration pointing at a fake provider
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            addr: "127.0.0.1:0".to_string(),
            api_key: api_key.into(),
            app_name: "crypto-app".to_string(),
            base_url: base_url.into(),
            provider_timeout: Duration::from_secs(10),
        }
    }
}
