//! Metapackage for cross-service tests.
//!
//! The end-to-end tests in `tests/` wire the account service, the crypto
//! service and the gateway together over real sockets.

pub use account_service;
pub use api_gateway;
pub use common;
pub use crypto_service;
