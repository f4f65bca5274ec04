//! Transaction domain entity
//!
//! A single income or expense recorded against an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::user::UserId;

pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE_SIZE: u64 = 500;

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TransactionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

/// A recorded transaction. `amount` is always positive; `kind` gives the sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// Amount with its sign applied (negative for expenses)
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Data needed to record a new transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Fields that may change on an existing transaction
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub account_id: Option<AccountId>,
    pub kind: Option<TransactionKind>,
    pub amount: Option<i64>,
    pub category: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionUpdate {
    /// Produce the transaction as it will look after this update
    pub fn apply_to(&self, current: &Transaction) -> Transaction {
        Transaction {
            id: current.id,
            account_id: self.account_id.unwrap_or(current.account_id),
            user_id: current.user_id,
            kind: self.kind.unwrap_or(current.kind),
            amount: self.amount.unwrap_or(current.amount),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| current.category.clone()),
            description: match &self.description {
                Some(d) => d.clone(),
                None => current.description.clone(),
            },
            occurred_at: self.occurred_at.unwrap_or(current.occurred_at),
            created_at: current.created_at,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.account_id.is_none()
            && self.kind.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.occurred_at.is_none()
    }
}

/// Criteria for listing a user's transactions
///
/// `from` is inclusive and `to` is exclusive.
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            account_id: None,
            kind: None,
            category: None,
            from: None,
            to: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.account_id.map_or(true, |id| tx.account_id == id)
            && self.kind.map_or(true, |k| tx.kind == k)
            && self
                .category
                .as_deref()
                .map_or(true, |c| tx.category == c)
            && self.from.map_or(true, |from| tx.occurred_at >= from)
            && self.to.map_or(true, |to| tx.occurred_at < to)
    }
}
