use async_trait::async_trait;
use dashmap::DashMap;
use pairly_config::LockSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use super::{DistributedLock, LockError, LockLease, LockResult};
use crate::secure_id::secure_random_hex;

type LockTable = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// In-process lock table. Guards are released on drop, so a cancelled or
/// panicking holder frees the resource immediately.
pub struct LocalLock {
    locks: LockTable,
    acquire_timeout: Duration,
}

/// Held mutex plus the table entry it belongs to.
///
/// Dropping it unlocks the resource and forgets the entry once nobody else
/// holds or awaits it.
#[derive(Debug)]
pub(crate) struct LocalGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockTable,
    resource: String,
}

impl Drop for LocalGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        prune(&self.locks, &self.resource);
    }
}

fn prune(locks: &DashMap<String, Arc<Mutex<()>>>, resource: &str) {
    locks.remove_if(resource, |_, mutex| Arc::strong_count(mutex) == 1);
}

impl LocalLock {
    pub fn new(settings: &LockSettings) -> Self {
        Self::with_timeout(Duration::from_millis(settings.acquire_timeout_ms))
    }

    pub fn with_timeout(acquire_timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            acquire_timeout,
        }
    }

    /// Number of resources with a live mutex entry.
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}

impl Default for LocalLock {
    fn default() -> Self {
        Self::new(&LockSettings::default())
    }
}

#[async_trait]
impl DistributedLock for LocalLock {
    async fn acquire(&self, resource: &str) -> LockResult<LockLease> {
        let mutex = self
            .locks
            .entry(resource.to_string())
            .or_default()
            .clone();

        match tokio::time::timeout(self.acquire_timeout, mutex.lock_owned()).await {
            Ok(guard) => {
                debug!(resource, "Local lock acquired");
                let guard = LocalGuard {
                    guard: Some(guard),
                    locks: self.locks.clone(),
                    resource: resource.to_string(),
                };
                Ok(LockLease::local(resource, secure_random_hex(8), guard))
            }
            Err(_) => {
                // The holder may have let go while the timed-out wait was being dropped.
                prune(&self.locks, resource);
                let waited_ms = self.acquire_timeout.as_millis() as u64;
                warn!(resource, waited_ms, "Local lock acquisition timed out");
                Err(LockError::Timeout {
                    resource: resource.to_string(),
                    waited_ms,
                })
            }
        }
    }

    async fn release(&self, lease: LockLease) -> LockResult<bool> {
        // Unlocking and pruning happen in `LocalGuard::drop`.
        drop(lease);
        Ok(true)
    }
}
