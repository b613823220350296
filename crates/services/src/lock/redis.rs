use async_trait::async_trait;
use pairly_config::LockSettings;
use redis::Script;
use redis::aio::ConnectionManager;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{DistributedLock, LockError, LockLease, LockResult};
use crate::secure_id::secure_random_hex;

static RELEASE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        if redis.call("GET", KEYS[1]) == ARGV[1] then
            return redis.call("DEL", KEYS[1])
        else
            return 0
        end
        "#,
    )
});

const TOKEN_BYTES: usize = 16;

/// Lease-based lock on the shared Redis.
pub struct RedisLock {
    conn: ConnectionManager,
    key_prefix: String,
    lease: Duration,
    acquire_timeout: Duration,
    retry_interval: Duration,
}

impl RedisLock {
    pub fn new(conn: ConnectionManager, settings: &LockSettings) -> Self {
        Self {
            conn,
            key_prefix: settings.key_prefix.clone(),
            lease: Duration::from_millis(settings.lease_ms),
            acquire_timeout: Duration::from_millis(settings.acquire_timeout_ms),
            retry_interval: Duration::from_millis(settings.retry_interval_ms.max(1)),
        }
    }

    pub fn key(&self, resource: &str) -> String {
        format!("{}:{}", self.key_prefix, resource)
    }
}

#[async_trait]
impl DistributedLock for RedisLock {
    async fn acquire(&self, resource: &str) -> LockResult<LockLease> {
        let key = self.key(resource);
        let token = secure_random_hex(TOKEN_BYTES);
        let lease_ms = self.lease.as_millis() as u64;
        let started = Instant::now();

        loop {
            let mut conn = self.conn.clone();
            let acquired: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&token)
                .arg("NX")
                .arg("PX")
                .arg(lease_ms)
                .query_async(&mut conn)
                .await?;

            if acquired.is_some() {
                debug!(%key, lease_ms, "Lock acquired");
                return Ok(LockLease::remote(resource, token));
            }

            let waited = started.elapsed();
            if waited >= self.acquire_timeout {
                warn!(%key, waited_ms = waited.as_millis() as u64, "Lock acquisition timed out");
                return Err(LockError::Timeout {
                    resource: resource.to_string(),
                    waited_ms: waited.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.retry_interval.min(self.acquire_timeout - waited)).await;
        }
    }

    async fn release(&self, lease: LockLease) -> LockResult<bool> {
        let key = self.key(lease.resource());
        let mut conn = self.conn.clone();
        let removed: i64 = RELEASE_SCRIPT
            .key(&key)
            .arg(lease.token())
            .invoke_async(&mut conn)
            .await?;
        debug!(%key, released = removed > 0, "Lock released");
        Ok(removed > 0)
    }
}
