//! Client side of the crypto price service
//!
//! The orchestrator only sees [`PriceSource`]. Every failure a source can
//! report is classified here, and the orchestrator collapses all of them
//! into one internal error before anything reaches a caller.

use std::time::Duration;

use async_trait::async_trait;
use common::decimal::{from_f64, Price};
use common::envelope::Envelope;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Why a unit price could not be obtained
#[derive(Debug, Error)]
pub enum PriceSourceError {
    #[error("price service unreachable: {0}")]
    Network(String),

    #[error("price lookup timed out")]
    Timeout,

    #[error("price service answered with status {0}")]
    Status(u16),

    #[error("malformed price payload: {0}")]
    Malformed(String),

    #[error("price payload has no {0} key")]
    MissingCurrency(String),

    #[error("price {0} is not a positive number")]
    InvalidPrice(String),
}

impl From<reqwest::Error> for PriceSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PriceSourceError::Timeout
        } else if err.is_decode() {
            PriceSourceError::Malformed(err.to_string())
        } else {
            PriceSourceError::Network(err.to_string())
        }
    }
}

/// Source of current market prices
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current price of one unit of `symbol`, expressed in `quote`
    async fn unit_price(&self, symbol: &str, quote: &str) -> Result<Price, PriceSourceError>;
}

/// Payload of `GET /v1/crypto/prices`
#[derive(Debug, Deserialize)]
struct PricesPayload {
    #[serde(rename = "Prices")]
    prices: HashMap<String, serde_json::Value>,
}

/// Price source backed by the crypto service's HTTP API
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPriceSource {
    /// Create a client for the crypto service at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PriceSourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PriceSourceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn unit_price(&self, symbol: &str, quote: &str) -> Result<Price, PriceSourceError> {
        let url = format!("{}/v1/crypto/prices", self.base_url);
        debug!("Fetching {} price in {} from {}", symbol, quote, url);

        let response = self.client
            .get(&url)
            .query(&[("symbol", symbol), ("symbolsTo", quote)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceSourceError::Status(response.status().as_u16()));
        }

        let envelope: Envelope = response.json().await?;
        if envelope.have_error {
            return Err(PriceSourceError::Malformed(format!(
                "error envelope: {:?}", envelope.error
            )));
        }
        let payload = envelope.payload
            .ok_or_else(|| PriceSourceError::Malformed("envelope has no payload".to_string()))?;
        let prices: PricesPayload = serde_json::from_value(payload)
            .map_err(|e| PriceSourceError::Malformed(e.to_string()))?;

        parse_unit_price(&prices.prices, quote)
    }
}

/// Pick `quote` out of a price map and check it is usable as a divisor
pub fn parse_unit_price(
    prices: &HashMap<String, serde_json::Value>,
    quote: &str,
) -> Result<Price, PriceSourceError> {
    let raw = prices
        .get(quote)
        .ok_or_else(|| PriceSourceError::MissingCurrency(quote.to_string()))?;

    let value = raw
        .as_f64()
        .ok_or_else(|| PriceSourceError::Malformed(format!("{} is not a number", raw)))?;

    let price = from_f64(value).map_err(|_| PriceSourceError::InvalidPrice(value.to_string()))?;
    if price <= Price::ZERO {
        return Err(PriceSourceError::InvalidPrice(value.to_string()));
    }
    Ok(price)
}
