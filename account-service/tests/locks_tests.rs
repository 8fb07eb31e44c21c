mod support;

use std::sync::Arc;
use std::time::Duration;

use account_service::ledger::{ActivityLedger, BalanceLedger};
use account_service::locks::AccountLocks;
use account_service::{AccountRepository, InMemoryAccountRepository, TransactionOrchestrator};
use common::decimal::dec;
use common::error::Error;
use support::FixedPrices;
use uuid::Uuid;

#[tokio::test]
async fn test_released_lock_leaves_no_entry() {
    let locks = AccountLocks::new();

    let guard = locks.acquire(Uuid::new_v4()).await;
    assert_eq!(locks.len(), 1);
    drop(guard);

    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_entry_survives_while_someone_waits() {
    let locks = Arc::new(AccountLocks::new());
    let id = Uuid::new_v4();

    let first = locks.acquire(id).await;
    let waiter = {
        let locks = locks.clone();
        tokio::spawn(async move {
            let _second = locks.acquire(id).await;
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    drop(first);
    // The waiter still references the mutex
    waiter.await.unwrap();

    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_unknown_accounts_do_not_accumulate_locks() {
    let repo: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
    let locks = Arc::new(AccountLocks::new());
    let orchestrator = TransactionOrchestrator::new(
        BalanceLedger::new(repo.clone()),
        ActivityLedger::new(repo),
        Arc::new(FixedPrices::new().with("BTC", dec!(50000))),
        locks.clone(),
        Duration::from_secs(1),
    );

    for _ in 0..50 {
        let id = Uuid::new_v4();
        let err = orchestrator.buy(id, "BTC", dec!(10)).await.unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(_)));
        let err = orchestrator.fake_deposit(id, dec!(10)).await.unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(_)));
    }

    assert!(locks.is_empty());
}
