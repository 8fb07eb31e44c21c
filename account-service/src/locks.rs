//! Per-account serialisation

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

/// One async mutex per account. Every read-compute-write over an account's
/// balance or activities runs while holding its guard.
///
/// A mutex only lives while someone holds or waits for it, so ids that
/// never resolve to an account leave nothing behind.
#[derive(Default)]
pub struct AccountLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one account, released on drop
pub struct AccountGuard {
    account_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to an account
    pub async fn acquire(&self, account_id: Uuid) -> AccountGuard {
        let lock = self.locks.entry(account_id).or_default().clone();
        let guard = lock.lock_owned().await;

        AccountGuard {
            account_id,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// Number of accounts with a live mutex
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        self.guard.take();
        // The map's own reference is the last one: no holder, no waiter
        self.locks
            .remove_if(&self.account_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
