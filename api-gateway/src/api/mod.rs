//! API handlers
//!
//! Each handler resolves what the client is allowed to ask for (the account
//! id always comes from the verified token) and forwards the call to the
//! owning service through [`crate::upstream::UpstreamClient`].

pub mod account;
pub mod auth;
pub mod crypto;
pub mod response;

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::upstream::REQUEST_ID_HEADER;

pub use response::ApiResponse;

/// Id of the request being handled, taken from `x-request-id`
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CorrelationId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CorrelationId(request_id_of(&parts.headers)))
    }
}

/// Request id header value, or a fresh one when the header is absent
pub fn request_id_of(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Liveness probe
pub async fn health() -> ApiResponse<serde_json::Value> {
    ApiResponse::new(serde_json::json!({ "status": "ok" }))
}
