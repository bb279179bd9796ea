//! Per-user mutual exclusion for storage operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Map of user id to an async mutex.
///
/// Every mutating sequence of disk and metadata steps for a user runs while
/// holding that user's guard; different users never contend.
#[derive(Debug, Default, Clone)]
pub struct UserLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl UserLocks {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, user_id: i64) -> Arc<AsyncMutex<()>> {
        let mut map = match self.inner.lock() {
            Ok(map) => map,
            // The map holds no invariants a panicking holder could break.
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(user_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for and take the user's guard.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        self.entry(user_id).lock_owned().await
    }

    /// Drop the user's entry, e.g. after the account is purged.
    pub fn forget(&self, user_id: i64) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(&user_id);
        }
    }

    /// Number of users with a lock entry.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether no user has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
