//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{DateTime, Utc};

use crate::app::hash_api_key;
use crate::domain::entities::{
    Account, AccountId, AccountKind, Investment, InvestmentId, InvestmentKind, Transaction,
    TransactionId, TransactionKind, User, UserId,
};

/// API key whose hash is stored on `test_user()`
pub const TEST_API_KEY: &str = "sk-test-key";

/// Create a test user with default values
pub fn test_user() -> User {
    User {
        id: UserId::new(),
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        api_key_hash: hash_api_key(TEST_API_KEY),
        default_currency: "USD".to_string(),
        created_at: Utc::now(),
        last_seen_at: None,
    }
}

/// Create a test user with a specific email
pub fn test_user_with_email(email: &str) -> User {
    User {
        email: email.to_string(),
        api_key_hash: hash_api_key(&format!("sk-{}", email)),
        ..test_user()
    }
}

/// Create a USD checking account with no transactions
pub fn test_account(user_id: UserId) -> Account {
    test_account_with_balance(user_id, 0)
}

pub fn test_account_with_balance(user_id: UserId, opening_balance: i64) -> Account {
    let now = Utc::now();
    Account {
        id: AccountId::new(),
        user_id,
        name: "Checking".to_string(),
        kind: AccountKind::Checking,
        currency: "USD".to_string(),
        opening_balance,
        balance: opening_balance,
        total_income: 0,
        total_expense: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Create a transaction row; does not touch any account aggregates
pub fn test_transaction(
    account: &Account,
    kind: TransactionKind,
    amount: i64,
    occurred_at: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        account_id: account.id,
        user_id: account.user_id,
        kind,
        amount,
        category: "groceries".to_string(),
        description: None,
        occurred_at,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Create a test investment: 10 units bought for 1000.00, now 120.00 each
pub fn test_investment(user_id: UserId) -> Investment {
    test_investment_with_symbol(user_id, "VTI")
}

pub fn test_investment_with_symbol(user_id: UserId, symbol: &str) -> Investment {
    let now = Utc::now();
    Investment {
        id: InvestmentId::new(),
        user_id,
        symbol: symbol.to_string(),
        name: format!("{} fund", symbol),
        kind: InvestmentKind::Etf,
        quantity: 10.0,
        cost_basis: 100_000,
        current_price: 12_000,
        currency: "USD".to_string(),
        purchased_at: now,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
