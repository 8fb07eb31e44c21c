mod support;

use std::sync::Arc;

use common::error::Error;
use crypto_service::{CryptoService, Timebase};
use support::StubProvider;

#[tokio::test]
async fn test_get_price() {
    let provider = StubProvider::new().with_price("USD", 50000.0).with_price("EUR", 46000.0);
    let service = CryptoService::new(Arc::new(provider));

    let prices = service.get_price("BTC", &["USD".to_string()]).await.unwrap();
    assert_eq!(prices.prices.len(), 1);
    assert_eq!(prices.prices["USD"], 50000.0);

    let err = service.get_price("BTC", &[]).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn test_get_history_validates_limit() {
    let provider = Arc::new(StubProvider::new().with_candle(10.0, 8.0));
    let service = CryptoService::new(provider.clone());

    let history = service.get_history(Timebase::Hours, "BTC", "USD", 5).await.unwrap();
    assert_eq!(history.data.len(), 1);
    assert_eq!(
        provider.history_calls.lock().unwrap()[0],
        (Timebase::Hours, "BTC".to_string(), "USD".to_string(), 5)
    );

    for limit in [0, -3] {
        let err = service.get_history(Timebase::Days, "BTC", "USD", limit).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}

#[tokio::test]
async fn test_price_difference() {
    let provider = StubProvider::new()
        .with_price("USD", 110.0)
        .with_candle(120.0, 80.0)
        .with_candle(200.0, 150.0);
    let service = CryptoService::new(Arc::new(provider));

    let diff = service.get_price_difference(Timebase::Days, "BTC", "USD", 1).await.unwrap();
    // midpoint of the first candle is 100
    assert!((diff.diff - 10.0).abs() < 1e-9);
    assert!((diff.diff_percents - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_price_difference_missing_data() {
    let no_quote = StubProvider::new().with_price("EUR", 1.0).with_candle(2.0, 1.0);
    let service = CryptoService::new(Arc::new(no_quote));
    let err = service.get_price_difference(Timebase::Days, "BTC", "USD", 1).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));

    let no_candles = StubProvider::new().with_price("USD", 1.0);
    let service = CryptoService::new(Arc::new(no_candles));
    let err = service.get_price_difference(Timebase::Days, "BTC", "USD", 1).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));

    let flat = StubProvider::new().with_price("USD", 1.0).with_candle(0.0, 0.0);
    let service = CryptoService::new(Arc::new(flat));
    let err = service.get_price_difference(Timebase::Days, "BTC", "USD", 1).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
}

#[test]
fn test_timebase_parsing() {
    assert_eq!("days".parse::<Timebase>().unwrap(), Timebase::Days);
    assert_eq!("hours".parse::<Timebase>().unwrap(), Timebase::Hours);
    assert_eq!("minutes".parse::<Timebase>().unwrap(), Timebase::Minutes);
    assert!(matches!("weeks".parse::<Timebase>(), Err(Error::BadRequest(_))));
    assert!(matches!("Days".parse::<Timebase>(), Err(Error::BadRequest(_))));
    assert_eq!(Timebase::default(), Timebase::Days);
}
