use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::{KeyValueStore, StoreResult};

/// Typed, namespaced records over a shared key-value store.
///
/// Every key is `{prefix}:{id}`, so record families sharing one store cannot collide.
pub struct RecordStore<T> {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            _record: PhantomData,
        }
    }

    pub fn key(&self, id: &str) -> String {
        format!("{}:{}", self.prefix, id)
    }

    pub async fn put(&self, id: &str, record: &T, ttl_secs: u64) -> StoreResult<()> {
        let key = self.key(id);
        let value = serde_json::to_string(record)?;
        self.store.set_ex(&key, value, ttl_secs).await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<T>> {
        let key = self.key(id);
        match self.store.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => {
                debug!(%key, "Record not found");
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        self.store.del(&self.key(id)).await
    }
}
