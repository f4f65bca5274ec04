//! No-op adapter for CacheStore
//!
//! Always misses and always succeeds. Used when Redis is not configured or
//! cannot be reached at startup, so every read goes to the database.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::CacheStore;
use crate::error::CacheError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    fn backend(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn sweep(&self, _default_ttl: Duration) -> Result<u64, CacheError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_misses() {
        let cache = NoopCache;
        cache
            .set("k", "v", Duration::from_secs(10))
            .await
            .unwrap();

        assert!(cache.get("k").await.unwrap().is_none());
        assert_eq!(cache.delete(&["k".to_string()]).await.unwrap(), 0);
        assert_eq!(cache.backend(), "disabled");
    }
}
