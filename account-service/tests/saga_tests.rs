mod support;

use std::sync::Arc;
use std::time::Duration;

use account_service::orchestrator::FOREIGN_FAILURE;
use account_service::ledger::ActivityLedger;
use account_service::{AccountService, InMemoryAccountRepository, TradeSide};
use common::decimal::{dec, Amount, Quantity};
use common::error::Error;
use common::model::account::Balance;
use support::{new_account, service_with, test_config, FaultyRepository, FixedPrices, StalledPrices, UnreachablePrices};

fn btc_at_50k() -> Arc<FixedPrices> {
    Arc::new(FixedPrices::new().with("BTC", dec!(50000)).with("ETH", dec!(2500)))
}

#[tokio::test]
async fn test_buy_then_sell_round_trip() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "alice").await;

    let receipt = service.buy_activity(id, "BTC", dec!(5000)).await.unwrap();
    assert_eq!(receipt.side, TradeSide::Buy);
    assert_eq!(receipt.quantity, dec!(0.1));
    assert_eq!(receipt.balance_usd, dec!(10000));

    let balance = service.get_balance(id).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(10000)));
    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities.len(), 1);
    assert_eq!(view.activities[0].amount, dec!(0.1));

    let receipt = service.sell_activity(id, "BTC", dec!(0), dec!(0.1)).await.unwrap();
    assert_eq!(receipt.side, TradeSide::Sell);
    assert_eq!(receipt.usd, dec!(5000));

    let balance = service.get_balance(id).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(15000)));

    // Selling out removes the row
    let view = service.get_activities(id, "", false).await.unwrap();
    assert!(view.activities.is_empty());
}

#[tokio::test]
async fn test_buy_twice_increments_holding() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "bob").await;

    service.buy_activity(id, "BTC", dec!(1000)).await.unwrap();
    service.buy_activity(id, "BTC", dec!(1500)).await.unwrap();

    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.05));
    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(12500)));
}

#[tokio::test]
async fn test_sell_by_usd_amount() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "carol").await;

    service.buy_activity(id, "BTC", dec!(5000)).await.unwrap();
    // USD amount wins over the asset amount
    let receipt = service.sell_activity(id, "BTC", dec!(2500), dec!(0.09)).await.unwrap();
    assert_eq!(receipt.quantity, dec!(0.05));

    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.05));
    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(12500)));
}

#[tokio::test]
async fn test_buy_more_than_balance() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "dave").await;

    let err = service.buy_activity(id, "BTC", dec!(20000)).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientBalance(_)));
    assert_eq!(err.status(), 422);

    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(15000)));
    let view = service.get_activities(id, "", false).await.unwrap();
    assert!(view.activities.is_empty());
}

#[tokio::test]
async fn test_sell_more_than_holdings() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "erin").await;
    service.buy_activity(id, "BTC", dec!(5000)).await.unwrap();

    let err = service.sell_activity(id, "BTC", dec!(0), dec!(0.2)).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientHoldings(_)));

    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(10000)));
    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.1));
}

#[tokio::test]
async fn test_sell_never_held_leaves_balance_alone() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "frank").await;

    let err = service.sell_activity(id, "ETH", dec!(100), dec!(0)).await.unwrap_err();
    assert!(matches!(err, Error::ActivityNotFound(_)));

    let balance = service.get_balance(id).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(15000)));
    assert_eq!(balance.version, 0);
}

#[tokio::test]
async fn test_rejects_bad_magnitudes_before_any_store_access() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let unknown = uuid::Uuid::new_v4();

    let err = service.buy_activity(unknown, "BTC", dec!(0)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = service.buy_activity(unknown, "BTC", dec!(-5)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = service.buy_activity(unknown, "  ", dec!(5)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let err = service.sell_activity(unknown, "BTC", dec!(0), dec!(0)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = service.sell_activity(unknown, "BTC", dec!(-1), dec!(1)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = service.sell_activity(unknown, "BTC", dec!(1), dec!(-1)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn test_unknown_account() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let err = service.buy_activity(uuid::Uuid::new_v4(), "BTC", dec!(5)).await.unwrap_err();
    assert!(matches!(err, Error::AccountNotFound(_)));
}

#[tokio::test]
async fn test_price_source_down_is_internal_and_mutates_nothing() {
    let service = AccountService::in_memory(Arc::new(UnreachablePrices), &test_config());
    let id = new_account(&service, "grace").await;

    let err = service.buy_activity(id, "BTC", dec!(100)).await.unwrap_err();
    match &err {
        Error::Internal(message) => assert_eq!(message, FOREIGN_FAILURE),
        other => panic!("expected Internal, got {:?}", other),
    }
    // Third-party text never reaches the caller
    assert!(!err.public_message().contains("10.0.0.1"));

    let balance = service.get_balance(id).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(15000)));
    assert_eq!(balance.version, 0);
}

#[tokio::test]
async fn test_missing_symbol_price_is_internal() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "heidi").await;

    let err = service.buy_activity(id, "DOGE", dec!(100)).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(15000)));
}

#[tokio::test]
async fn test_zero_price_is_internal() {
    let prices = Arc::new(FixedPrices::new().with("NIL", dec!(0)));
    let service = AccountService::in_memory(prices, &test_config());
    let id = new_account(&service, "ivan").await;

    let err = service.buy_activity(id, "NIL", dec!(100)).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(15000)));
}

#[tokio::test]
async fn test_price_timeout_is_internal() {
    let mut config = test_config();
    config.price_timeout = Duration::from_millis(50);
    let service = AccountService::in_memory(Arc::new(StalledPrices(Duration::from_secs(5))), &config);
    let id = new_account(&service, "judy").await;

    let err = service.sell_activity(id, "BTC", dec!(10), dec!(0)).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
    assert_eq!(service.get_balance(id).await.unwrap().version, 0);
}

#[tokio::test]
async fn test_failed_activity_write_rolls_back_buy() {
    let repo = Arc::new(FaultyRepository::new());
    let service = service_with(repo.clone(), btc_at_50k());
    let id = new_account(&service, "mallory").await;

    repo.fail_activity_writes();
    let err = service.buy_activity(id, "BTC", dec!(5000)).await.unwrap_err();

    // The original error comes back, not a consistency violation
    match &err {
        Error::Internal(message) => assert_eq!(message, "activity store unavailable"),
        other => panic!("expected the activity error, got {:?}", other),
    }

    let balance = service.get_balance(id).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(15000)));
    // debit and rollback
    assert_eq!(balance.version, 2);
    assert!(repo.inner.activities.is_empty());
}

#[tokio::test]
async fn test_failed_activity_write_rolls_back_sell() {
    let repo = Arc::new(FaultyRepository::new());
    let service = service_with(repo.clone(), btc_at_50k());
    let id = new_account(&service, "niaj").await;
    service.buy_activity(id, "BTC", dec!(5000)).await.unwrap();

    repo.fail_activity_writes();
    let err = service.sell_activity(id, "BTC", dec!(0), dec!(0.1)).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));

    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(10000)));
    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.1));
}

#[tokio::test]
async fn test_failed_rollback_is_a_consistency_violation() {
    let repo = Arc::new(FaultyRepository::new());
    let service = service_with(repo.clone(), btc_at_50k());
    let id = new_account(&service, "olivia").await;

    repo.fail_activity_writes();
    // debit goes through, the rollback does not
    repo.allow_balance_writes(1);

    let err = service.buy_activity(id, "BTC", dec!(5000)).await.unwrap_err();
    assert_eq!(err.code(), "consistency_violation");
    assert_eq!(err.status(), 500);
    match err {
        Error::ConsistencyViolation { original, rollback } => {
            assert!(original.to_string().contains("activity store unavailable"));
            assert!(rollback.to_string().contains("balance store unavailable"));
        }
        other => panic!("expected ConsistencyViolation, got {:?}", other),
    }

    // The store is left debited
    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(10000)));
}

#[tokio::test]
async fn test_saga_finishes_when_caller_gives_up() {
    let repo = Arc::new(FaultyRepository::new());
    let service = service_with(repo.clone(), btc_at_50k());
    let id = new_account(&service, "peggy").await;

    repo.delay_activity_writes(Duration::from_millis(200));
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        service.buy_activity(id, "BTC", dec!(5000)),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(10000)));
    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_buys_never_overdraw() {
    let service = Arc::new(AccountService::in_memory(btc_at_50k(), &test_config()));
    let id = new_account(&service, "trent").await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.buy_activity(id, "BTC", dec!(1000)).await
        }));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(Error::InsufficientBalance(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(succeeded, 15);
    assert_eq!(rejected, 5);
    assert_eq!(service.get_balance(id).await.unwrap().usd, Some(dec!(0)));
    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.3));
}

#[tokio::test]
async fn test_deposit() {
    let repo = Arc::new(FaultyRepository::new());
    let service = service_with(repo.clone(), btc_at_50k());
    let id = new_account(&service, "victor").await;
    repo.inner.balances.insert(id, Balance::new(id, dec!(1000)));

    let balance = service.fake_deposit(id, dec!(500)).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(1500)));

    let err = service.fake_deposit(id, dec!(0)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = service.fake_deposit(id, dec!(-10)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = service.fake_deposit(uuid::Uuid::new_v4(), dec!(10)).await.unwrap_err();
    assert!(matches!(err, Error::AccountNotFound(_)));
}

#[tokio::test]
async fn test_null_balance_is_internal() {
    let repo = Arc::new(FaultyRepository::new());
    let service = service_with(repo.clone(), btc_at_50k());
    let id = new_account(&service, "walter").await;
    repo.inner.balances.insert(id, Balance { usd: None, ..Balance::new(id, dec!(0)) });

    let err = service.buy_activity(id, "BTC", dec!(10)).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
    let err = service.fake_deposit(id, dec!(10)).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[tokio::test]
async fn test_dust_buy_is_rejected_without_writes() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "dusty").await;

    // 1e-28 USD buys less than the smallest representable BTC quantity
    let err = service.buy_activity(id, "BTC", Amount::new(1, 28)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    assert_eq!(err.status(), 400);

    let balance = service.get_balance(id).await.unwrap();
    assert_eq!(balance.usd, Some(dec!(15000)));
    assert_eq!(balance.version, 0);
    let view = service.get_activities(id, "", false).await.unwrap();
    assert!(view.activities.is_empty());
}

#[tokio::test]
async fn test_dust_sell_is_rejected_without_writes() {
    let service = AccountService::in_memory(btc_at_50k(), &test_config());
    let id = new_account(&service, "sandy").await;
    service.buy_activity(id, "BTC", dec!(5000)).await.unwrap();
    let before = service.get_balance(id).await.unwrap();

    let err = service
        .sell_activity(id, "BTC", Amount::new(1, 28), Quantity::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let after = service.get_balance(id).await.unwrap();
    assert_eq!(after.usd, Some(dec!(10000)));
    assert_eq!(after.version, before.version);
    let view = service.get_activities(id, "BTC", false).await.unwrap();
    assert_eq!(view.activities[0].amount, dec!(0.1));
}

#[tokio::test]
async fn test_activity_ledger_refuses_non_positive_deltas() {
    let ledger = ActivityLedger::new(Arc::new(InMemoryAccountRepository::new()));
    let id = uuid::Uuid::new_v4();

    let err = ledger.upsert_on_buy(id, "BTC", Quantity::ZERO).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    let err = ledger.plan_sell(id, "BTC", dec!(-1)).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    assert!(ledger.get_activities(id, &[]).await.unwrap().is_empty());
}
