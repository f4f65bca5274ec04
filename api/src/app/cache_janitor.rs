//! Background cache sweep
//!
//! Periodically asks the cache to put an expiry on anything under the
//! application prefix that has none. Keys without a TTL
//! can appear when something outside this service writes into the namespace.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::ports::CacheStore;

pub struct CacheJanitor<C>
where
    C: CacheStore,
{
    store: Arc<C>,
    interval: Duration,
    default_ttl: Duration,
}

impl<C> CacheJanitor<C>
where
    C: CacheStore + 'static,
{
    pub fn new(store: Arc<C>, interval: Duration, default_ttl: Duration) -> Self {
        Self {
            store,
            interval,
            default_ttl,
        }
    }

    /// One sweep. Returns the number of keys given a TTL; errors count as zero.
    pub async fn run_once(&self) -> u64 {
        match self.store.sweep(self.default_ttl).await {
            Ok(0) => {
                tracing::debug!(backend = self.store.backend(), "cache sweep found nothing");
                0
            }
            Ok(touched) => {
                tracing::info!(backend = self.store.backend(), touched, "cache sweep finished");
                touched
            }
            Err(e) => {
                tracing::warn!(backend = self.store.backend(), error = %e, "cache sweep failed");
                0
            }
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    /// Returns `None` when the interval is zero (sweeping disabled).
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> Option<JoinHandle<()>> {
        if self.interval.is_zero() {
            tracing::info!("cache sweep disabled");
            return None;
        }

        tracing::info!(interval_secs = self.interval.as_secs(), "cache sweep scheduled");

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::info!("cache sweep stopped");
                            break;
                        }
                    }
                }
            }
        }))
    }
}
