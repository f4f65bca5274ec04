//! Ledger arithmetic
//!
//! How a transaction moves its account's derived aggregates.

use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionKind};

/// Largest magnitude accepted for any stored money value, in minor units
///
/// Ten trillion in a two-decimal currency. Sums over millions of such values
/// still fit in an `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Change a single transaction makes to its account's aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerEffect {
    pub balance_delta: i64,
    pub income_delta: i64,
    pub expense_delta: i64,
}

impl LedgerEffect {
    /// Effect of a transaction of `kind` for a positive `amount`
    pub fn of(kind: TransactionKind, amount: i64) -> Self {
        match kind {
            TransactionKind::Income => Self {
                balance_delta: amount,
                income_delta: amount,
                expense_delta: 0,
            },
            TransactionKind::Expense => Self {
                balance_delta: -amount,
                income_delta: 0,
                expense_delta: amount,
            },
        }
    }

    pub fn of_transaction(tx: &Transaction) -> Self {
        Self::of(tx.kind, tx.amount)
    }

    /// The effect that undoes this one
    pub fn reversed(&self) -> Self {
        Self {
            balance_delta: -self.balance_delta,
            income_delta: -self.income_delta,
            expense_delta: -self.expense_delta,
        }
    }

    pub fn combine(&self, other: &LedgerEffect) -> Self {
        Self {
            balance_delta: self.balance_delta + other.balance_delta,
            income_delta: self.income_delta + other.income_delta,
            expense_delta: self.expense_delta + other.expense_delta,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Income and expense sums over a set of transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub income: i64,
    pub expense: i64,
}

impl LedgerTotals {
    pub fn from_transactions<'a>(txs: impl IntoIterator<Item = &'a Transaction>) -> Self {
        txs.into_iter().fold(Self::default(), |mut acc, tx| {
            match tx.kind {
                TransactionKind::Income => acc.income = acc.income.saturating_add(tx.amount),
                TransactionKind::Expense => acc.expense = acc.expense.saturating_add(tx.amount),
            }
            acc
        })
    }

    pub fn net(&self) -> i64 {
        self.income.saturating_sub(self.expense)
    }
}
