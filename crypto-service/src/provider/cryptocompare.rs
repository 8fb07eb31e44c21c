use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use common::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::MarketDataProvider;
use crate::config::CryptoServiceConfig;
use crate::models::{HistoricalData, Prices, Timebase};

const PRICE_ENDPOINT: &str = "/data/price";

/// History responses wrap the data with a status
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data")]
    data: Option<HistoricalData>,
}

/// Client for the CryptoCompare REST API
#[derive(Debug, Clone)]
pub struct CryptoCompareClient {
    client: Client,
    base_url: String,
    api_key: String,
    app_name: String,
}

impl CryptoCompareClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        app_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::ConfigurationError("CryptoCompare API key cannot be empty".to_string()));
        }

        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::ConfigurationError(format!("Invalid CryptoCompare URL: {}", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigurationError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            app_name: app_name.into(),
        })
    }

    pub fn with_config(config: &CryptoServiceConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.api_key, &config.app_name, config.provider_timeout)
    }

    /// GET an endpoint with the credential parameters added
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("CryptoCompare request {} {:?}", endpoint, query);

        let response = self.client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("extraParams", self.app_name.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!("CryptoCompare unreachable: {}", e);
                Error::Upstream("Market data provider is unreachable".to_string())
            })?;

        if response.status() != StatusCode::OK {
            warn!("CryptoCompare answered {} for {}", response.status(), endpoint);
            return Err(Error::Upstream(format!(
                "Market data provider answered with status {}", response.status().as_u16()
            )));
        }

        response.json::<T>().await.map_err(|e| {
            warn!("Undecodable CryptoCompare response: {}", e);
            Error::Upstream("Malformed response from market data provider".to_string())
        })
    }
}

/// The price endpoint answers either a currency map or an error object
fn parse_prices(body: Value) -> Result<Prices> {
    if body.get("Response").and_then(Value::as_str) == Some("Error") {
        let message = body.get("Message").and_then(Value::as_str).unwrap_or("unknown error");
        return Err(Error::Upstream(format!("Market data provider error: {}", message)));
    }

    let prices: BTreeMap<String, f64> = serde_json::from_value(body)
        .map_err(|e| Error::Upstream(format!("Malformed price map: {}", e)))?;
    Ok(Prices { prices })
}

#[async_trait]
impl MarketDataProvider for CryptoCompareClient {
    async fn latest_price(&self, symbol: &str, symbols_to: &[String]) -> Result<Prices> {
        let body: Value = self
            .get(PRICE_ENDPOINT, &[("fsym", symbol.to_string()), ("tsyms", symbols_to.join(","))])
            .await?;
        parse_prices(body)
    }

    async fn history(&self, timebase: Timebase, fsym: &str, tsym: &str, limit: u32) -> Result<HistoricalData> {
        let response: HistoryResponse = self
            .get(
                timebase.endpoint(),
                &[("fsym", fsym.to_string()), ("tsym", tsym.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        if response.response == "Error" {
            return Err(Error::Upstream(format!("Market data provider error: {}", response.message)));
        }
        response.data
            .ok_or_else(|| Error::Upstream("History response has no data".to_string()))
    }
}
