//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod accounts;
pub mod investments;
pub mod summary;
pub mod transactions;
pub mod users;

use serde::{Deserialize, Deserializer};

pub use accounts::{
    create_account, delete_account, get_account, list_accounts, recalculate_account,
    update_account,
};
pub use investments::{
    create_investment, delete_investment, get_investment, get_portfolio, list_investments,
    update_investment,
};
pub use summary::{get_monthly, get_summary};
pub use transactions::{
    create_transaction, delete_transaction, get_transaction, list_account_transactions,
    list_transactions, update_transaction,
};
pub use users::{me, register, update_me};

/// Deserialize a nullable field so that an explicit `null` becomes
/// `Some(None)`. Pair with `#[serde(default)]` so a missing field is `None`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
