//! Account API handlers
//!
//! Handles the authenticated account endpoints:
//! - Get and delete the account
//! - Balance and deposits
//! - Buy, sell and list activities

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{RawQuery, State};
use axum::response::Response;
use axum::{Extension, Json};
use reqwest::Method;
use serde_json::Value;

use super::CorrelationId;
use crate::auth::Claims;
use crate::error::{ApiError, ApiResult};
use crate::upstream::Upstream;
use crate::AppState;

/// Get the caller's account
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
) -> Response {
    let path = format!("/v1/account/{}", claims.sub);
    state.upstream.proxy(Upstream::Account, Method::GET, &path, None, None, &request_id).await
}

/// Delete the caller's account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
) -> Response {
    let path = format!("/v1/account/{}", claims.sub);
    state.upstream.proxy(Upstream::Account, Method::DELETE, &path, None, None, &request_id).await
}

/// Get the caller's balance (`fetchActivity` is passed through)
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
    RawQuery(query): RawQuery,
) -> Response {
    let path = format!("/v1/account/{}/balance", claims.sub);
    state
        .upstream
        .proxy(Upstream::Account, Method::GET, &path, query.as_deref(), None, &request_id)
        .await
}

/// Deposit USD (`deposit` is passed through)
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
    RawQuery(query): RawQuery,
) -> Response {
    let path = format!("/v1/account/{}/balance", claims.sub);
    state
        .upstream
        .proxy(Upstream::Account, Method::PUT, &path, query.as_deref(), None, &request_id)
        .await
}

/// Buy a symbol
pub async fn buy(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e).with_request_id(request_id.clone()))?;
    let path = format!("/v1/account/{}/activity", claims.sub);
    Ok(state
        .upstream
        .proxy(Upstream::Account, Method::POST, &path, None, Some(&body), &request_id)
        .await)
}

/// Sell a symbol
pub async fn sell(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e).with_request_id(request_id.clone()))?;
    let path = format!("/v1/account/{}/activity", claims.sub);
    Ok(state
        .upstream
        .proxy(Upstream::Account, Method::DELETE, &path, None, Some(&body), &request_id)
        .await)
}

/// List holdings (`symbols` and `fetchPrices` are passed through)
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    CorrelationId(request_id): CorrelationId,
    RawQuery(query): RawQuery,
) -> Response {
    let path = format!("/v1/account/{}/activity", claims.sub);
    state
        .upstream
        .proxy(Upstream::Account, Method::GET, &path, query.as_deref(), None, &request_id)
        .await
}
