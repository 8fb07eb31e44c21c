//! Configuration for the account service

use std::env;
use std::time::Duration;

/// Length bounds applied to new credentials
#[derive(Debug, Clone)]
pub struct CredentialPolicy {
    pub login_min_length: usize,
    pub login_max_length: usize,
    pub password_min_length: usize,
    pub password_max_length: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            login_min_length: env_or("LOGIN_MIN_LENGTH", 3),
            login_max_length: env_or("LOGIN_MAX_LENGTH", 32),
            password_min_length: env_or("PASSWORD_MIN_LENGTH", 6),
            password_max_length: env_or("PASSWORD_MAX_LENGTH", 64),
        }
    }
}

/// Configuration for the account service
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// Listening address
    pub addr: String,
    /// Database URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// Database connection pool size
    pub db_pool_size: u32,
    /// Base URL of the crypto price service
    pub crypto_service_url: String,
    /// Upper bound on a single price lookup
    pub price_timeout: Duration,
    /// Bcrypt work factor
    pub bcrypt_cost: u32,
    /// Credential validation bounds
    pub credentials: CredentialPolicy,
}

impl Default for AccountServiceConfig {
    fn default() -> Self {
        Self {
            addr: env::var("ACCOUNT_ADDR").unwrap_or_else(|_| "127.0.0.1:8001".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_pool_size: env_or("DB_POOL_SIZE", 5),
            crypto_service_url: env::var("CRYPTO_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8002".to_string()),
            price_timeout: Duration::from_secs(env_or("PRICE_TIMEOUT_SECS", 5)),
            bcrypt_cost: env_or("BCRYPT_COST", 10),
            credentials: CredentialPolicy::default(),
        }
    }
}

impl AccountServiceConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Configuration for tests: in-memory store, cheapest bcrypt cost
    pub fn for_tests(crypto_service_url: impl Into<String>) -> Self {
        Self {
            addr: "127.0.0.1:0".to_string(),
            database_url: None,
            db_pool_size: 1,
            crypto_service_url: crypto_service_url.into(),
            price_timeout: Duration::from_secs(2),
            bcrypt_cost: 4,
            credentials: CredentialPolicy {
                login_min_length: 3,
                login_max_length: 32,
                password_min_length: 6,
                password_max_length: 64,
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
