mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use redis_store::RedisCacheStore;

/// How long group settings stay cached before the next database read.
pub const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(300);

/// `Disabled` misses every read and drops every write.
#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled,
    Redis(RedisCacheStore),
}

/// Read-through JSON cache in front of PostgreSQL.
#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    async fn get_bytes(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        match &self.backend {
            CacheBackend::Disabled => Ok(None),
            CacheBackend::Redis(store) => store.get(key).await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(bytes) = self.get_bytes(key).await? else {
            return Ok(None);
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}"))
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    /// Serve `key` from cache, or run `loader` and populate the cache.
    ///
    /// Cache failures are logged and never fail the read.
    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(?e, cache_key = key, "cache get failed; falling back to database"),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(?e, cache_key = key, "cache set failed; returning database value");
        }

        Ok(loaded)
    }
}

pub fn group_settings_key(cache: &CacheService, chat_id: i64) -> String {
    cache.key(format!("settings:{chat_id}"))
}

pub async fn invalidate_group_settings(cache: &CacheService, chat_id: i64) -> anyhow::Result<()> {
    cache.del(&group_settings_key(cache, chat_id)).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CacheService, group_settings_key};

    #[test]
    fn keys_are_prefixed() {
        let cache = CacheService::disabled("bioguard:test");
        assert_eq!(
            group_settings_key(&cache, -1001234),
            "bioguard:test:settings:-1001234"
        );
        assert!(!cache.is_redis_enabled());
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = CacheService::disabled("bioguard:test");
        cache
            .set_json("k", &5_u32, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get_json::<u32>("k").await.unwrap(), None);

        let loaded = cache
            .get_or_load_json("k", Duration::from_secs(10), || async { Ok(9_u32) })
            .await
            .unwrap();
        assert_eq!(loaded, 9);
    }
}
