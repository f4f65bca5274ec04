//! Read-through cache layer
//!
//! Services read through `CacheLayer::read_through` and call
//! `CacheLayer::invalidate` after every committed write. The database stays
//! the source of truth: a cache failure is logged and the request carries on
//! against the database.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::entities::{AccountId, InvestmentId, UserId};
use crate::domain::ports::CacheStore;
use crate::error::{AppError, CacheError};

/// Builds every cache key the API uses
#[derive(Debug, Clone)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn user_accounts(&self, user: &UserId) -> String {
        format!("{}:user:{}:accounts", self.prefix, user)
    }

    pub fn account(&self, account: &AccountId) -> String {
        format!("{}:account:{}", self.prefix, account)
    }

    pub fn account_transactions(&self, account: &AccountId) -> String {
        format!("{}:account:{}:transactions", self.prefix, account)
    }

    pub fn user_investments(&self, user: &UserId) -> String {
        format!("{}:user:{}:investments", self.prefix, user)
    }

    pub fn investment(&self, investment: &InvestmentId) -> String {
        format!("{}:investment:{}", self.prefix, investment)
    }

    pub fn portfolio(&self, user: &UserId) -> String {
        format!("{}:user:{}:portfolio", self.prefix, user)
    }

    pub fn summary(&self, user: &UserId) -> String {
        format!("{}:user:{}:summary", self.prefix, user)
    }

    pub fn monthly(&self, user: &UserId, months: u32) -> String {
        format!("{}:user:{}:monthly:{}", self.prefix, user, months)
    }

    /// Matches every monthly series of a user, whatever the window size
    pub fn monthly_pattern(&self, user: &UserId) -> String {
        format!("{}:user:{}:monthly:*", self.prefix, user)
    }

    pub fn on_account_create(&self, user: &UserId) -> Vec<String> {
        vec![self.user_accounts(user), self.summary(user)]
    }

    /// Keys made stale by editing or recalculating an account
    pub fn on_account_write(&self, user: &UserId, account: &AccountId) -> Vec<String> {
        vec![
            self.account(account),
            self.user_accounts(user),
            self.summary(user),
        ]
    }

    /// Monthly series are not listed; clear them with `monthly_pattern`
    pub fn on_account_delete(&self, user: &UserId, account: &AccountId) -> Vec<String> {
        vec![
            self.account(account),
            self.account_transactions(account),
            self.user_accounts(user),
            self.summary(user),
        ]
    }

    /// Keys made stale by a transaction write touching `accounts`.
    /// Monthly series are not listed; clear them with `monthly_pattern`.
    pub fn on_transaction_write(&self, user: &UserId, accounts: &[AccountId]) -> Vec<String> {
        let mut keys = Vec::with_capacity(accounts.len() * 2 + 2);
        for (i, account) in accounts.iter().enumerate() {
            if accounts[..i].contains(account) {
                continue;
            }
            keys.push(self.account(account));
            keys.push(self.account_transactions(account));
        }
        keys.push(self.user_accounts(user));
        keys.push(self.summary(user));
        keys
    }

    /// Keys made stale by any investment write
    pub fn on_investment_write(&self, user: &UserId, investment: &InvestmentId) -> Vec<String> {
        vec![
            self.investment(investment),
            self.user_investments(user),
            self.portfolio(user),
            self.summary(user),
        ]
    }
}

/// Counters reported by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub hits: u64,
    pub misses: u64,
}

/// Read-through and invalidation on top of a `CacheStore`
pub struct CacheLayer<C>
where
    C: CacheStore,
{
    store: Arc<C>,
    keys: CacheKeys,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<C> CacheLayer<C>
where
    C: CacheStore,
{
    pub fn new(store: Arc<C>, prefix: &str, ttl: Duration) -> Self {
        Self {
            store,
            keys: CacheKeys::new(prefix),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            backend: self.store.backend(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Return the cached value for `key`, or run `load`, cache its result
    /// for the configured TTL and return it. Errors from `load` are returned
    /// and nothing is cached.
    pub async fn read_through<T, F, Fut>(&self, key: &str, load: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Dropping undecodable cache entry");
                    self.invalidate(vec![key.to_string()]).await;
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "Cache read failed"),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key, "cache miss");

        let value = load().await?;

        if let Err(e) = self.populate(key, &value).await {
            tracing::warn!(key, error = %e, "Cache write failed");
        }

        Ok(value)
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw, self.ttl).await
    }

    /// Delete keys after a write. Failures are logged, not returned.
    pub async fn invalidate(&self, keys: Vec<String>) {
        match self.store.delete(&keys).await {
            Ok(removed) => tracing::debug!(?keys, removed, "cache invalidated"),
            Err(e) => tracing::warn!(?keys, error = %e, "Cache invalidation failed"),
        }
    }

    /// Delete every key matching `pattern`. Failures are logged, not returned.
    pub async fn invalidate_matching(&self, pattern: &str) {
        match self.store.delete_matching(pattern).await {
            Ok(removed) => tracing::debug!(pattern, removed, "cache invalidated"),
            Err(e) => tracing::warn!(pattern, error = %e, "Cache invalidation failed"),
        }
    }
}
