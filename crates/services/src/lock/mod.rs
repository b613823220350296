//! Per-resource mutual exclusion.
//!
//! Two backends:
//! - `RedisLock`: `SET NX PX` lease with a random token, released by a
//!   compare-and-delete script. Safe across processes sharing the store.
//! - `LocalLock`: per-key async mutex. Single process only.
//!
//! Callers should go through [`with_lock`], which releases on every exit
//! path of the critical section.

pub mod memory;
pub mod redis;

pub use memory::LocalLock;
use memory::LocalGuard;
pub use self::redis::RedisLock;

use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Timed out after {waited_ms}ms waiting for lock on {resource}")]
    Timeout { resource: String, waited_ms: u64 },
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

pub type LockResult<T> = Result<T, LockError>;

/// Proof of ownership handed out by [`DistributedLock::acquire`].
#[derive(Debug)]
pub struct LockLease {
    resource: String,
    token: String,
    guard: Option<LocalGuard>,
}

impl LockLease {
    pub(crate) fn remote(resource: &str, token: String) -> Self {
        Self {
            resource: resource.to_string(),
            token,
            guard: None,
        }
    }

    pub(crate) fn local(resource: &str, token: String, guard: LocalGuard) -> Self {
        Self {
            resource: resource.to_string(),
            token,
            guard: Some(guard),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether dropping the lease releases it (in-process locks only).
    pub fn is_local(&self) -> bool {
        self.guard.is_some()
    }
}

#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Waits, bounded by the backend's acquire timeout, until `resource` is free.
    async fn acquire(&self, resource: &str) -> LockResult<LockLease>;

    /// Returns `false` when the lease had already lapsed and was not ours to release.
    async fn release(&self, lease: LockLease) -> LockResult<bool>;
}

/// Runs `critical_section` while holding the lock for `resource`.
///
/// The lease is released whether the section succeeds or fails. A release
/// failure is logged and does not replace the section's own result.
pub async fn with_lock<T, E, F, Fut>(
    lock: &dyn DistributedLock,
    resource: &str,
    critical_section: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<LockError>,
{
    let lease = lock.acquire(resource).await?;
    let result = critical_section().await;

    match lock.release(lease).await {
        Ok(true) => {}
        Ok(false) => warn!(resource, "Lock lease lapsed before release"),
        Err(err) => warn!(resource, error = %err, "Failed to release lock"),
    }

    result
}
