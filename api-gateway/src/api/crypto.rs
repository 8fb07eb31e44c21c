use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::response::Response;
use reqwest::Method;

use super::CorrelationId;
use crate::upstream::Upstream;
use crate::AppState;

async fn forward(state: &AppState, path: &str, query: Option<String>, request_id: &str) -> Response {
    state
        .upstream
        .proxy(Upstream::Crypto, Method::GET, path, query.as_deref(), None, request_id)
        .await
}

/// Latest prices
pub async fn prices(
    State(state): State<Arc<AppState>>,
    CorrelationId(request_id): CorrelationId,
    RawQuery(query): RawQuery,
) -> Response {
    forward(&state, "/v1/crypto/prices", query, &request_id).await
}

/// OHLCV history
pub async fn history(
    State(state): State<Arc<AppState>>,
    CorrelationId(request_id): CorrelationId,
    RawQuery(query): RawQuery,
) -> Response {
    forward(&state, "/v1/crypto/history", query, &request_id).await
}

/// Price change over a period
pub async fn diff(
    State(state): State<Arc<AppState>>,
    CorrelationId(request_id): CorrelationId,
    RawQuery(query): RawQuery,
) -> Response {
    forward(&state, "/v1/crypto/diff", query, &request_id).await
}
