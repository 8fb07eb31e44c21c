//! Crypto price service implementation

use std::sync::Arc;

use common::error::{Error, Result};
use tracing::debug;

use crate::models::{HistoricalData, PriceDifference, Prices, Timebase};
use crate::provider::MarketDataProvider;

/// Prices, history and price changes from a market data provider
pub struct CryptoService {
    provider: Arc<dyn MarketDataProvider>,
}

impl CryptoService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Latest price of `symbol` in each of `symbols_to`
    pub async fn get_price(&self, symbol: &str, symbols_to: &[String]) -> Result<Prices> {
        if symbol.is_empty() || symbols_to.is_empty() {
            return Err(Error::BadRequest("A symbol and at least one target currency are required".to_string()));
        }
        self.provider.latest_price(symbol, symbols_to).await
    }

    /// OHLCV history at the given resolution
    pub async fn get_history(&self, timebase: Timebase, fsym: &str, tsym: &str, limit: i64) -> Result<HistoricalData> {
        if limit < 1 {
            return Err(Error::BadRequest(format!("Limit must be at least 1, got {}", limit)));
        }
        let limit = u32::try_from(limit)
            .map_err(|_| Error::BadRequest(format!("Limit {} is too large", limit)))?;

        self.provider.history(timebase, fsym, tsym, limit).await
    }

    /// Latest price against the midpoint of the candle `offset` periods back
    pub async fn get_price_difference(
        &self,
        timebase: Timebase,
        symbol: &str,
        symbol_to: &str,
        offset: i64,
    ) -> Result<PriceDifference> {
        let latest = self.get_price(symbol, &[symbol_to.to_string()]).await?;
        let history = self.get_history(timebase, symbol, symbol_to, offset).await?;

        let latest_price = *latest.prices.get(symbol_to).ok_or_else(|| {
            Error::Upstream(format!("Latest prices have no {} key", symbol_to))
        })?;
        let first = history.data.first()
            .ok_or_else(|| Error::Upstream("History has no candles".to_string()))?;

        let history_price = first.mid();
        if history_price == 0.0 {
            return Err(Error::Upstream("Historical price is zero".to_string()));
        }

        let diff = latest_price - history_price;
        debug!(symbol = %symbol, symbol_to = %symbol_to, latest_price, history_price, "Price difference");

        Ok(PriceDifference {
            diff,
            diff_percents: diff / history_price * 100.0,
        })
    }
}
