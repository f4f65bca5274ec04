//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL.

pub mod account_repo;
pub mod investment_repo;
pub mod transaction_repo;
pub mod user_repo;


use sea_orm::{ConnectionTrait, DatabaseConnection};

pub use account_repo::PostgresAccountRepository;
pub use investment_repo::PostgresInvestmentRepository;
pub use transaction_repo::PostgresTransactionRepository;
pub use user_repo::PostgresUserRepository;

const INITIAL_SCHEMA: &str = include_str!("../../../migrations/001_initial.sql");

/// Apply the bundled schema. Statements are idempotent.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    db.execute_unprepared(INITIAL_SCHEMA).await?;
    Ok(())
}
