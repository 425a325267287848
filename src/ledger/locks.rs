//! Per-key exclusive sections
//!
//! Balance mutations hold the lock of every account they touch. Locks are
//! taken in ascending key order and each acquisition is bounded by a
//! timeout, so two operations racing over the same pair of accounts in
//! opposite directions can neither deadlock nor wait forever.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Default bound on a single lock acquisition
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);

/// Table of lazily created per-key mutexes.
///
/// A mutex nobody holds or waits on is dropped at the next acquisition, so
/// the table only tracks keys that are in use.
#[derive(Debug)]
pub struct LockTable {
    name: &'static str,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    timeout: Duration,
}

/// Guards held for the duration of one exclusive section
#[derive(Debug)]
pub struct LockSet {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockTable {
    pub fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    async fn handle(&self, key: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // Held and awaited handles have clones outside the table
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock every key in `keys`, in ascending order.
    ///
    /// Duplicate keys are locked once. Fails with `AppError::Busy` if any
    /// single acquisition exceeds the table's timeout; guards already taken
    /// are released on the way out.
    pub async fn acquire(&self, keys: &[Uuid]) -> AppResult<LockSet> {
        let ordered: BTreeSet<Uuid> = keys.iter().copied().collect();
        let mut guards = Vec::with_capacity(ordered.len());

        for key in ordered {
            let handle = self.handle(key).await;
            match tokio::time::timeout(self.timeout, handle.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    tracing::warn!(
                        table = self.name,
                        key = %key,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Lock acquisition timed out"
                    );
                    return Err(AppError::Busy(format!(
                        "{} {} is locked by another operation",
                        self.name, key
                    )));
                }
            }
        }

        Ok(LockSet { _guards: guards })
    }

    /// Lock a single key
    pub async fn acquire_one(&self, key: Uuid) -> AppResult<LockSet> {
        self.acquire(&[key]).await
    }

    /// Number of keys currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
