#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::error::{Error, Result};
use crypto_service::{HistoricalData, MarketDataProvider, Ohlcv, Prices, Timebase};

/// Provider answering from fixed data and recording history calls
#[derive(Default)]
pub struct StubProvider {
    pub prices: BTreeMap<String, f64>,
    pub candles: Vec<Ohlcv>,
    pub fail: bool,
    pub history_calls: Mutex<Vec<(Timebase, String, String, u32)>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, currency: &str, price: f64) -> Self {
        self.prices.insert(currency.to_string(), price);
        self
    }

    pub fn with_candle(mut self, high: f64, low: f64) -> Self {
        let time = 1_700_000_000 + self.candles.len() as i64 * 86_400;
        self.candles.push(Ohlcv {
            time,
            high,
            low,
            open: low,
            close: high,
            volume_from: 1.0,
            volume_to: high,
        });
        self
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn latest_price(&self, _symbol: &str, symbols_to: &[String]) -> Result<Prices> {
        if self.fail {
            return Err(Error::Upstream("Market data provider is unreachable".to_string()));
        }
        let prices = self.prices
            .iter()
            .filter(|(currency, _)| symbols_to.contains(currency))
            .map(|(currency, price)| (currency.clone(), *price))
            .collect();
        Ok(Prices { prices })
    }

    async fn history(&self, timebase: Timebase, fsym: &str, tsym: &str, limit: u32) -> Result<HistoricalData> {
        if self.fail {
            return Err(Error::Upstream("Market data provider is unreachable".to_string()));
        }
        self.history_calls
            .lock()
            .unwrap()
            .push((timebase, fsym.to_string(), tsym.to_string(), limit));

        Ok(HistoricalData {
            time_from: self.candles.first().map(|c| c.time).unwrap_or_default(),
            time_to: self.candles.last().map(|c| c.time).unwrap_or_default(),
            data: self.candles.clone(),
        })
    }
}
