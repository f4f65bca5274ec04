//! Cache port
//!
//! A string key/value store with per-key expiry. Values are JSON documents
//! written by the read-through layer in `app::cache_layer`.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name reported by the health endpoint
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove keys; returns how many existed
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Remove every key matching a glob pattern (`*` wildcard)
    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError>;

    /// Housekeeping pass: give every key under the store's prefix that has
    /// no expiry `default_ttl`. Returns how many keys were given one.
    async fn sweep(&self, default_ttl: Duration) -> Result<u64, CacheError>;
}
