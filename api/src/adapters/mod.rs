//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod cache;
pub mod postgres;

pub use cache::CacheProvider;
pub use postgres::{
    run_migrations, PostgresAccountRepository, PostgresInvestmentRepository,
    PostgresTransactionRepository, PostgresUserRepository,
};
