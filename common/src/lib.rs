//! Common types and utilities for the crypto app services
//!
//! This library contains shared types, utilities, and abstractions used across
//! the account service, the crypto price service and the API gateway. It provides
//! a unified approach to error handling, database access, the inter-service
//! response envelope and the domain models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;
pub mod envelope;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;
pub use envelope::{Envelope, EnvelopeError};
