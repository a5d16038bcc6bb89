use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, AsyncCommands, Client, RedisError};
use tokio::sync::RwLock;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Returns the cached value, or `None` when disconnected or on a miss.
    pub(crate) async fn get_cached(&self, key: &str) -> Result<Option<String>, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(None);
        };

        manager.get(key).await
    }

    pub(crate) async fn set_cached(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(());
        };

        manager.set_ex(key, value, ttl_seconds).await
    }

    pub(crate) async fn invalidate(&self, key: &str) -> Result<(), RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(());
        };

        manager.del(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::{RedisHandle, RedisHealth};

    #[tokio::test]
    async fn disconnected_handle_behaves_as_empty_cache() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());

        assert!(matches!(redis.health().await, RedisHealth::Disconnected));
        assert_eq!(redis.get_cached("courses:instructor:x").await.expect("get"), None);
        redis.set_cached("courses:instructor:x", "[]", 120).await.expect("set");
        redis.invalidate("courses:instructor:x").await.expect("del");
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn cache_roundtrip_against_live_redis() {
        let url = std::env::var("COURSEFORGE_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string());
        let redis = RedisHandle::new(url);
        redis.connect().await.expect("redis connect");

        let key = format!("courses:instructor:{}", uuid::Uuid::new_v4());
        redis.set_cached(&key, "[1]", 5).await.expect("set");
        assert_eq!(redis.get_cached(&key).await.expect("get").as_deref(), Some("[1]"));
        redis.invalidate(&key).await.expect("del");
        assert_eq!(redis.get_cached(&key).await.expect("get"), None);
    }
}
