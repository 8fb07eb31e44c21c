use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use common::error::Error;
use common::model::account::Role;
use tracing::debug;

use crate::api::request_id_of;
use crate::error::ApiError;
use crate::AppState;

/// Require a valid Bearer token carrying the `user` role. The claims are
/// handed to the handler as a request extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request_id_of(request.headers());

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::new(Error::Unauthorized("Missing bearer token".to_string()))
                .with_request_id(request_id.clone())
        })?;

    let claims = state
        .jwt
        .verify(token)
        .map_err(|e| ApiError::new(e).with_request_id(request_id.clone()))?;

    if !claims.has_role(Role::User) {
        return Err(ApiError::new(Error::Forbidden("Token lacks the user role".to_string()))
            .with_request_id(request_id));
    }

    debug!(account_id = %claims.sub, "Authenticated request");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
