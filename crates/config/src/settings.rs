use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub store: StoreSettings,
    pub redis: RedisSettings,
    pub invite: InviteSettings,
    pub lock: LockSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub name: String,
}

/// Which collaborators back the coordinator.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Shared Redis: keyed records plus `SET NX PX` leases. Safe across processes.
    Redis,
    /// Process-local map and mutex table. Single node only.
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InviteSettings {
    pub key_prefix: String,
    pub default_ttl_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LockSettings {
    pub key_prefix: String,
    /// Lease length; a holder that dies releases implicitly after this.
    pub lease_ms: u64,
    pub acquire_timeout_ms: u64,
    pub retry_interval_ms: u64,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            key_prefix: "invite".to_string(),
            default_ttl_ms: 24 * 60 * 60 * 1000,
        }
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            key_prefix: "lock".to_string(),
            lease_ms: 5_000,
            acquire_timeout_ms: 3_000,
            retry_interval_ms: 50,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let invite = InviteSettings::default();
        let lock = LockSettings::default();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("PAIRLY"),
            )
            .set_default("app.name", "pairly")?
            .set_default("store.backend", "redis")?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("invite.key_prefix", invite.key_prefix)?
            .set_default("invite.default_ttl_ms", invite.default_ttl_ms as i64)?
            .set_default("lock.key_prefix", lock.key_prefix)?
            .set_default("lock.lease_ms", lock.lease_ms as i64)?
            .set_default("lock.acquire_timeout_ms", lock.acquire_timeout_ms as i64)?
            .set_default("lock.retry_interval_ms", lock.retry_interval_ms as i64)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "pairly".to_string(),
            },
            store: StoreSettings {
                backend: StoreBackend::Memory,
            },
            redis: RedisSettings {
                url: "redis://127.0.0.1:6379".to_string(),
            },
            invite: InviteSettings::default(),
            lock: LockSettings::default(),
        }
    }
}
