use pairly_config::Settings;
use redis::aio::ConnectionManager;
use tracing::info;

pub async fn connect(settings: &Settings) -> Result<ConnectionManager, redis::RedisError> {
    let client = redis::Client::open(settings.redis.url.as_str())?;
    let mut manager = ConnectionManager::new(client).await?;

    // Verify connection
    let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
    info!(app = %settings.app.name, %pong, "Connected to Redis");

    Ok(manager)
}
