//! Error types for the crypto app services
//!
//! This module provides a unified error handling system for all services.
//! It defines standard error types that can be used across service
//! boundaries, a stable machine-readable code for each of them and the HTTP
//! status the transports answer with.

use std::fmt::Display;
use thiserror::Error;

/// Crypto app error type
#[derive(Debug, Error)]
pub enum Error {
    /// Generic lookup failure
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error when an account (or its balance row) cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Error when an account holds no activity for a symbol
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error when an account has insufficient funds
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Error when an account holds less of an asset than it tries to sell
    #[error("Insufficient holdings: {0}")]
    InsufficientHoldings(String),

    /// Login or password did not match
    #[error("Incorrect login or password")]
    InvalidCredentials,

    /// Unique constraint violation
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency token mismatch
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid authentication
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A foreign service answered badly or not at all
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// A compensating write failed after a partial mutation; the store no
    /// longer matches the ledger contract
    #[error("Consistency violation: {original}; rollback failed: {rollback}")]
    ConsistencyViolation {
        /// Error that triggered the compensation
        original: Box<Error>,
        /// Error raised by the compensation itself
        rollback: Box<Error>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code carried in response envelopes
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::AccountNotFound(_) => "account_not_found",
            Error::ActivityNotFound(_) => "activity_not_found",
            Error::BadRequest(_) => "bad_request",
            Error::ValidationError(_) => "validation_error",
            Error::InsufficientBalance(_) => "insufficient_balance",
            Error::InsufficientHoldings(_) => "insufficient_holdings",
            Error::InvalidCredentials => "invalid_credentials",
            Error::AlreadyExists(_) => "already_exists",
            Error::Conflict(_) => "conflict",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::Upstream(_) => "upstream_error",
            Error::Internal(_) => "internal_error",
            Error::ConsistencyViolation { .. } => "consistency_violation",
            Error::ConfigurationError(_) => "configuration_error",
            Error::Database(_) => "database_error",
            Error::Migration(_) => "migration_error",
            Error::Serialization(_) => "serialization_error",
            Error::DecimalError(_) => "decimal_error",
        }
    }

    /// HTTP status code the transports answer with
    pub fn status(&self) -> u16 {
        match self {
            // Client errors (4xx)
            Error::NotFound(_) | Error::AccountNotFound(_) | Error::ActivityNotFound(_) => 404,
            Error::BadRequest(_) | Error::ValidationError(_) => 400,
            Error::InsufficientBalance(_) | Error::InsufficientHoldings(_) => 422,
            Error::InvalidCredentials | Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::AlreadyExists(_) | Error::Conflict(_) => 409,

            // Server errors (5xx)
            Error::Upstream(_) => 502,
            Error::Internal(_)
            | Error::ConsistencyViolation { .. }
            | Error::ConfigurationError(_)
            | Error::Database(_)
            | Error::Migration(_)
            | Error::Serialization(_)
            | Error::DecimalError(_) => 500,
        }
    }

    /// Whether the error is a business-rule rejection rather than a fault
    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }

    /// Message safe to hand to clients. Server faults never leak their
    /// underlying driver or third-party text.
    pub fn public_message(&self) -> String {
        match self {
            Error::Database(_) | Error::Migration(_) | Error::Serialization(_) | Error::DecimalError(_) => {
                "Internal error".to_string()
            }
            Error::ConsistencyViolation { .. } => {
                "Operation failed and the account could not be restored; it has been flagged for review".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::NotFound(msg) => Error::NotFound(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::ActivityNotFound(msg) => Error::ActivityNotFound(format!("{}: {}", context, msg)),
                Error::BadRequest(msg) => Error::BadRequest(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InsufficientBalance(msg) => Error::InsufficientBalance(format!("{}: {}", context, msg)),
                Error::InsufficientHoldings(msg) => Error::InsufficientHoldings(format!("{}: {}", context, msg)),
                Error::AlreadyExists(msg) => Error::AlreadyExists(format!("{}: {}", context, msg)),
                Error::Conflict(msg) => Error::Conflict(format!("{}: {}", context, msg)),
                Error::Unauthorized(msg) => Error::Unauthorized(format!("{}: {}", context, msg)),
                Error::Forbidden(msg) => Error::Forbidden(format!("{}: {}", context, msg)),
                Error::Upstream(msg) => Error::Upstream(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                // Login failures stay opaque; structured variants keep their payload
                e @ (Error::InvalidCredentials
                | Error::ConsistencyViolation { .. }
                | Error::Database(_)
                | Error::Migration(_)
                | Error::Serialization(_)) => e,
            }
        })
    }
}
