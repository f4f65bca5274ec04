use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// Unset runs without a cache
    pub redis_url: Option<String>,
    pub cache_ttl: Duration,
    /// Zero disables the background sweep
    pub cache_sweep_interval: Duration,
    pub cache_key_prefix: String,
    /// Apply the bundled schema at startup
    pub run_migrations: bool,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL").ok().filter(|u| !u.trim().is_empty()),
            cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECS", 300)?),
            cache_sweep_interval: Duration::from_secs(parse_var("CACHE_SWEEP_INTERVAL_SECS", 300)?),
            cache_key_prefix: env::var("CACHE_KEY_PREFIX")
                .unwrap_or_else(|_| "finvault".to_string()),
            run_migrations: parse_flag(env::var("RUN_MIGRATIONS").ok().as_deref()),
            port: parse_var("PORT", 8080)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
