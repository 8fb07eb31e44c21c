//! HTTP API of the crypto price service, under `/v1/crypto`

pub mod response;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use common::error::Error;
use tower_http::trace::TraceLayer;

use crate::models::{HistoricalData, PriceDifference, Prices, Timebase};
use crate::service::CryptoService;
use response::{ApiError, ApiResponse, ApiResult};

type Params = HashMap<String, String>;

/// Router for the crypto price service
pub fn router(service: Arc<CryptoService>) -> Router {
    let routes = Router::new()
        .route("/prices", get(get_prices))
        .route("/history", get(get_history))
        .route("/diff", get(get_price_difference));

    Router::new()
        .nest("/v1/crypto", routes)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// `GET /prices?symbol=BTC&symbolsTo=USD,EUR`
async fn get_prices(
    State(service): State<Arc<CryptoService>>,
    Query(params): Query<Params>,
) -> ApiResult<Prices> {
    require(&params, &["symbol", "symbolsTo"])?;

    let symbols_to: Vec<String> = params["symbolsTo"]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let prices = service.get_price(&params["symbol"], &symbols_to).await?;
    Ok(ApiResponse(prices))
}

/// `GET /history?timebase=days&symbol=BTC&symbolTo=USD&limit=10`
async fn get_history(
    State(service): State<Arc<CryptoService>>,
    Query(params): Query<Params>,
) -> ApiResult<HistoricalData> {
    require(&params, &["timebase", "symbol", "symbolTo", "limit"])?;

    let timebase: Timebase = params["timebase"].parse()?;
    let limit = parse_int(&params, "limit")?;

    let history = service
        .get_history(timebase, &params["symbol"], &params["symbolTo"], limit)
        .await?;
    Ok(ApiResponse(history))
}

/// `GET /diff?symbol=BTC&symbolTo=USD[&timebase=days][&offset=1]`
async fn get_price_difference(
    State(service): State<Arc<CryptoService>>,
    Query(params): Query<Params>,
) -> ApiResult<PriceDifference> {
    require(&params, &["symbol", "symbolTo"])?;

    let timebase = match params.get("timebase") {
        Some(raw) => raw.parse()?,
        None => Timebase::default(),
    };
    let offset = match params.get("offset") {
        Some(_) => parse_int(&params, "offset")?,
        None => 1,
    };

    let diff = service
        .get_price_difference(timebase, &params["symbol"], &params["symbolTo"], offset)
        .await?;
    Ok(ApiResponse(diff))
}

/// Fail with the first missing parameter
fn require(params: &Params, keys: &[&str]) -> Result<(), ApiError> {
    match keys.iter().find(|key| !params.contains_key(**key)) {
        Some(missing) => Err(ApiError(Error::BadRequest(format!(
            "Missing required query parameter: {}", missing
        )))),
        None => Ok(()),
    }
}

fn parse_int(params: &Params, key: &str) -> Result<i64, ApiError> {
    let raw = params.get(key).map(String::as_str).unwrap_or_default();
    raw.parse()
        .map_err(|_| ApiError(Error::BadRequest(format!("Query parameter {} must be an integer, got {}", key, raw))))
}
