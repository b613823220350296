//! TTL-capable key-value collaborators and the typed record adapter on top of them.
//!
//! Key layout:
//!
//! ```text
//! invite:{invite_id}          → InviteRecord JSON (EX = ceil(ttl_ms / 1000))
//! lock:invite:{invite_id}     → lease token (PX = lock.lease_ms), see `crate::lock`
//! ```

pub mod memory;
pub mod record;
pub mod redis;

pub use memory::MemoryStore;
pub use record::RecordStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal surface the coordinator needs from the shared store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes `value` and lets the store evict it after `ttl_secs` whole seconds.
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> StoreResult<()>;

    /// Returns whether a value was present.
    async fn del(&self, key: &str) -> StoreResult<bool>;
}
