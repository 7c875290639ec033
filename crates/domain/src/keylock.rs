//! Per-key mutation locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::EntityKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Number of tracked keys above which idle locks are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of async locks, one per entity key.
///
/// Holding the guard for a key makes the holder its single writer: other
/// mutations of the same key wait, mutations of other keys do not.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<EntityKey, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the key is free and returns its guard.
    pub async fn lock(&self, key: &EntityKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() >= PRUNE_THRESHOLD {
                // Only the registry holds an idle lock; holders and waiters own a clone.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Returns the number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
