//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod account;
pub mod investment;
pub mod ledger;
pub mod summary;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountId, AccountKind, AccountUpdate, NewAccount};
pub use investment::{Investment, InvestmentId, InvestmentKind, InvestmentUpdate, NewInvestment};
pub use ledger::{LedgerEffect, LedgerTotals, MAX_AMOUNT};
pub use summary::{
    month_window_start, monthly_series, FinancialSummary, Holding, MonthlyBucket,
    PortfolioSummary, DEFAULT_MONTHS, MAX_MONTHS,
};
pub use transaction::{
    NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionKind,
    TransactionUpdate, DEFAULT_CATEGORY, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use user::{NewUser, User, UserId, UserProfileUpdate};
