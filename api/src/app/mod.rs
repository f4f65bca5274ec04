//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, repositories and the cache.

pub mod account_service;
pub mod cache_janitor;
pub mod cache_layer;
pub mod investment_service;
pub mod summary_service;
pub mod transaction_service;
pub mod user_service;
pub mod validation;

pub use account_service::AccountService;
pub use cache_janitor::CacheJanitor;
pub use cache_layer::{CacheKeys, CacheLayer, CacheStats};
pub use investment_service::{InvestmentInput, InvestmentService};
pub use summary_service::SummaryService;
pub use transaction_service::{TransactionInput, TransactionService};
pub use user_service::{hash_api_key, UserService};
