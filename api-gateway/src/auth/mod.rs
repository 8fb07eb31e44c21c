//! Authentication: token issuing and the Bearer middleware

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtKeys};
pub use middleware::require_auth;
