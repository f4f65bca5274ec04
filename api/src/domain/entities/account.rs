//! Account domain entity
//!
//! An account holds money in a single currency. Its balance and income/expense
//! totals are derived aggregates maintained incrementally from transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::{LedgerEffect, LedgerTotals};
use super::user::UserId;

/// Unique identifier for an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
    Other,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Checking => write!(f, "checking"),
            AccountKind::Savings => write!(f, "savings"),
            AccountKind::Credit => write!(f, "credit"),
            AccountKind::Cash => write!(f, "cash"),
            AccountKind::Investment => write!(f, "investment"),
            AccountKind::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "credit" => Ok(AccountKind::Credit),
            "cash" => Ok(AccountKind::Cash),
            "investment" => Ok(AccountKind::Investment),
            "other" => Ok(AccountKind::Other),
            _ => Err(format!("Unknown account kind: {}", s)),
        }
    }
}

/// A money account owned by a user. All amounts are minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub opening_balance: i64,
    pub balance: i64,
    pub total_income: i64,
    pub total_expense: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// Apply a transaction's effect to the stored aggregates
    pub fn apply(&mut self, effect: &LedgerEffect) {
        self.balance = self.balance.saturating_add(effect.balance_delta);
        self.total_income = self.total_income.saturating_add(effect.income_delta);
        self.total_expense = self.total_expense.saturating_add(effect.expense_delta);
    }

    /// Overwrite the aggregates with totals recomputed from history
    pub fn reset_to(&mut self, totals: &LedgerTotals) {
        self.total_income = totals.income;
        self.total_expense = totals.expense;
        self.balance = self.opening_balance.saturating_add(totals.net());
    }

    /// Whether the stored aggregates satisfy the balance identity
    pub fn is_consistent(&self) -> bool {
        self.balance
            == self
                .opening_balance
                .saturating_add(self.total_income.saturating_sub(self.total_expense))
    }
}

/// Data needed to create a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: UserId,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub opening_balance: i64,
}

/// Mutable account attributes. Aggregates are never set through here.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
}
