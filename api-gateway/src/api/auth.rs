//! Signup and login
//!
//! Signup is relayed to the account service as is. Login checks the
//! credentials with the account service and, when they match, signs a token
//! for the account it names.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::error::Error;
use common::model::account::Role;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{ApiResponse, CorrelationId};
use crate::error::{ApiError, ApiResult};
use crate::upstream::{normalize, Upstream};
use crate::AppState;

/// Identity the account service answers a successful login with
#[derive(Debug, Deserialize)]
struct LoginOutcome {
    account_id: Uuid,
    roles: Vec<Role>,
}

/// Issued token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    pub account_id: Uuid,
}

/// Create an account
pub async fn signup(
    State(state): State<Arc<AppState>>,
    CorrelationId(request_id): CorrelationId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e).with_request_id(request_id.clone()))?;

    Ok(state
        .upstream
        .proxy(Upstream::Account, Method::POST, "/v1/account", None, Some(&body), &request_id)
        .await)
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    CorrelationId(request_id): CorrelationId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e).with_request_id(request_id.clone()))?;

    let envelope = state
        .upstream
        .call(Upstream::Account, Method::POST, "/v1/account/login", None, Some(&body), &request_id)
        .await
        .map_err(|e| ApiError::new(e).with_request_id(request_id.clone()))?;

    if envelope.have_error {
        return Ok(normalize(envelope, &request_id));
    }

    let outcome: LoginOutcome = envelope
        .into_payload()
        .map_err(|e| {
            ApiError::new(Error::Upstream(format!("Unexpected login payload: {}", e)))
                .with_request_id(request_id.clone())
        })?;

    let token = state
        .jwt
        .issue(outcome.account_id, outcome.roles)
        .map_err(|e| ApiError::new(e).with_request_id(request_id.clone()))?;

    info!(account_id = %outcome.account_id, "Token issued");
    Ok(ApiResponse::new(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.ttl().as_secs(),
        account_id: outcome.account_id,
    })
    .into_response())
}
