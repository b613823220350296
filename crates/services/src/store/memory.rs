use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::{KeyValueStore, StoreResult};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local store with Redis-like whole-second expiry.
///
/// Expired entries are dropped lazily on read, so `len` may count entries
/// that are no longer readable.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before the entry is physically evicted.
    pub fn expires_in(&self, key: &str) -> Option<Duration> {
        let entry = self.entries.get(key)?;
        entry.expires_at.checked_duration_since(Instant::now())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> StoreResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}
