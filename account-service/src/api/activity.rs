//! Activity API handlers: buy, sell and list holdings

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use common::decimal::{Amount, Quantity};
use serde::Deserialize;
use uuid::Uuid;

use super::response::{ApiError, ApiResponse, ApiResult};
use crate::orchestrator::TradeReceipt;
use crate::service::{AccountService, ActivitiesView};

/// Buy request: `price` is the USD amount to spend
#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    pub symbol: String,
    pub price: Amount,
}

/// Sell request: `price` in USD or `amount` in asset units
#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub symbol: String,
    #[serde(default)]
    pub price: Amount,
    #[serde(default)]
    pub amount: Quantity,
}

#[derive(Debug, Deserialize)]
pub struct ActivitiesQuery {
    #[serde(default)]
    pub symbols: String,
    #[serde(default, rename = "fetchPrices")]
    pub fetch_prices: bool,
}

pub async fn buy(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<BuyRequest>, JsonRejection>,
) -> ApiResult<TradeReceipt> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    let Json(request) = body.map_err(ApiError::rejected)?;
    let receipt = service.buy_activity(id, &request.symbol, request.price).await?;
    Ok(ApiResponse::ok(receipt))
}

pub async fn sell(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SellRequest>, JsonRejection>,
) -> ApiResult<TradeReceipt> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    let Json(request) = body.map_err(ApiError::rejected)?;
    let receipt = service
        .sell_activity(id, &request.symbol, request.price, request.amount)
        .await?;
    Ok(ApiResponse::ok(receipt))
}

pub async fn list(
    State(service): State<Arc<AccountService>>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ActivitiesQuery>, QueryRejection>,
) -> ApiResult<ActivitiesView> {
    let Path(id) = id.map_err(ApiError::rejected)?;
    let Query(query) = query.map_err(ApiError::rejected)?;
    let view = service.get_activities(id, &query.symbols, query.fetch_prices).await?;
    Ok(ApiResponse::ok(view))
}
