//! Redis adapter for CacheStore
//!
//! Uses a multiplexed `ConnectionManager`, which reconnects on its own after
//! Redis restarts. Key iteration always goes through `SCAN`, never `KEYS`.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::domain::ports::CacheStore;
use crate::error::CacheError;

/// TTL reply for a key that exists without an expiry
const NO_EXPIRY: i64 = -1;
const SCAN_BATCH: usize = 200;

pub struct RedisCache {
    conn: ConnectionManager,
    /// Namespace swept by `sweep`
    prefix: String,
}

impl RedisCache {
    /// Connect and verify the server answers
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let mut conn = client.get_connection_manager().await?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(CacheError::Connection(format!(
                "unexpected PING reply: {}",
                pong
            )));
        }

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(keys.to_vec()).await?;
        Ok(removed)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let keys = self.scan(pattern).await?;
        self.delete(&keys).await
    }

    async fn sweep(&self, default_ttl: Duration) -> Result<u64, CacheError> {
        let keys = self.scan(&format!("{}:*", self.prefix)).await?;
        let mut conn = self.conn.clone();
        let mut fixed = 0;

        for key in keys {
            let ttl: i64 = conn.ttl(&key).await?;
            if ttl == NO_EXPIRY {
                let _: () = redis::cmd("EXPIRE")
                    .arg(&key)
                    .arg(default_ttl.as_secs().max(1))
                    .query_async(&mut conn)
                    .await?;
                fixed += 1;
            }
        }

        Ok(fixed)
    }
}
