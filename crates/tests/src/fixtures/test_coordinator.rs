use pairly_config::{Settings, StoreBackend};
use pairly_services::secure_id::short_id;
use pairly_services::{
    DistributedLock, InviteService, KeyValueStore, LocalLock, MemoryStore, RedisLock, RedisStore,
};
use std::sync::Arc;

/// An `InviteService` wired to in-memory collaborators that tests can inspect.
pub struct TestCoordinator {
    pub service: Arc<InviteService>,
    pub store: Arc<MemoryStore>,
    pub lock: Arc<LocalLock>,
    pub settings: Settings,
}

impl TestCoordinator {
    pub fn spawn() -> Self {
        Self::spawn_with_settings(|_| {})
    }

    /// The `mutator` receives the settings after test defaults are applied.
    pub fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = test_settings();
        mutator(&mut settings);

        let store = Arc::new(MemoryStore::new());
        let lock = Arc::new(LocalLock::new(&settings.lock));
        let service = Arc::new(InviteService::new(
            store.clone() as Arc<dyn KeyValueStore>,
            lock.clone() as Arc<dyn DistributedLock>,
            &settings.invite,
        ));

        Self {
            service,
            store,
            lock,
            settings,
        }
    }

    pub fn invite_key(&self, invite_id: &str) -> String {
        format!("{}:{}", self.settings.invite.key_prefix, invite_id)
    }
}

/// Same wiring over a live Redis.
///
/// Requires a running Redis at 127.0.0.1:6379.
/// Set PAIRLY__REDIS__URL to override the connection string.
/// Each instance gets its own key prefixes for isolation.
pub struct RedisTestCoordinator {
    pub service: Arc<InviteService>,
    pub store: Arc<RedisStore>,
    pub lock: Arc<RedisLock>,
    pub conn: redis::aio::ConnectionManager,
    pub settings: Settings,
}

impl RedisTestCoordinator {
    pub async fn spawn() -> Self {
        let mut settings = test_settings();
        settings.store.backend = StoreBackend::Redis;
        if let Ok(url) = std::env::var("PAIRLY__REDIS__URL") {
            settings.redis.url = url;
        }
        settings.invite.key_prefix = short_id("invite_test");
        settings.lock.key_prefix = short_id("lock_test");

        let conn = pairly_db::connect(&settings)
            .await
            .expect("Failed to connect to Redis");
        let store = Arc::new(RedisStore::new(conn.clone()));
        let lock = Arc::new(RedisLock::new(conn.clone(), &settings.lock));
        let service = Arc::new(InviteService::new(
            store.clone() as Arc<dyn KeyValueStore>,
            lock.clone() as Arc<dyn DistributedLock>,
            &settings.invite,
        ));

        Self {
            service,
            store,
            lock,
            conn,
            settings,
        }
    }

    pub fn invite_key(&self, invite_id: &str) -> String {
        format!("{}:{}", self.settings.invite.key_prefix, invite_id)
    }
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.app.name = "pairly_test".to_string();
    settings.store.backend = StoreBackend::Memory;
    settings.lock.acquire_timeout_ms = 2_000;
    settings
}
