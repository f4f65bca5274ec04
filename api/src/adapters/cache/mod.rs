//! Cache adapters
//!
//! ```text
//! CacheProvider (enum)
//!   ├── Redis(RedisCache)   <- shared cache across API instances
//!   └── Noop(NoopCache)     <- always-miss fallback
//! ```
//!
//! The provider is picked once at startup. A Redis outage at boot degrades to
//! the no-op provider instead of refusing to start.

pub mod noop_cache;
pub mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::CacheStore;
use crate::error::CacheError;

pub use noop_cache::NoopCache;
pub use redis_cache::RedisCache;

pub enum CacheProvider {
    Redis(RedisCache),
    Noop(NoopCache),
}

impl CacheProvider {
    /// Connect to Redis when a URL is configured, otherwise run without a cache
    pub async fn from_url(url: Option<&str>, prefix: &str) -> Self {
        let Some(url) = url else {
            tracing::info!("REDIS_URL not set, caching disabled");
            return CacheProvider::Noop(NoopCache);
        };

        match RedisCache::connect(url, prefix).await {
            Ok(cache) => {
                tracing::info!("Redis cache connected");
                CacheProvider::Redis(cache)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, caching disabled");
                CacheProvider::Noop(NoopCache)
            }
        }
    }

    fn inner(&self) -> &dyn CacheStore {
        match self {
            CacheProvider::Redis(c) => c,
            CacheProvider::Noop(c) => c,
        }
    }
}

#[async_trait]
impl CacheStore for CacheProvider {
    fn backend(&self) -> &'static str {
        self.inner().backend()
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner().get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.inner().set(key, value, ttl).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        self.inner().delete(keys).await
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        self.inner().delete_matching(pattern).await
    }

    async fn sweep(&self, default_ttl: Duration) -> Result<u64, CacheError> {
        self.inner().sweep(default_ttl).await
    }
}
