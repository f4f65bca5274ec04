//! Read-side aggregates
//!
//! Portfolio, overall financial position and monthly cash-flow series.
//! These are what the cache layer stores per user.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::account::Account;
use super::investment::{percent_of, Investment, InvestmentId, InvestmentKind};
use super::transaction::{Transaction, TransactionKind};

pub const DEFAULT_MONTHS: u32 = 6;
pub const MAX_MONTHS: u32 = 24;

/// Sum of money values, clamped at the `i64` bounds
fn total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// An investment with its derived valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: InvestmentId,
    pub symbol: String,
    pub name: String,
    pub kind: InvestmentKind,
    pub quantity: f64,
    pub cost_basis: i64,
    pub market_value: i64,
    pub gain: i64,
    pub gain_pct: f64,
}

impl From<&Investment> for Holding {
    fn from(inv: &Investment) -> Self {
        Holding {
            id: inv.id,
            symbol: inv.symbol.clone(),
            name: inv.name.clone(),
            kind: inv.kind,
            quantity: inv.quantity,
            cost_basis: inv.cost_basis,
            market_value: inv.market_value(),
            gain: inv.gain(),
            gain_pct: inv.gain_pct(),
        }
    }
}

/// Valuation of all of a user's investments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub holdings: Vec<Holding>,
    pub total_cost_basis: i64,
    pub total_market_value: i64,
    pub total_gain: i64,
    pub gain_pct: f64,
}

impl PortfolioSummary {
    pub fn from_investments(investments: &[Investment]) -> Self {
        let holdings: Vec<Holding> = investments.iter().map(Holding::from).collect();
        let total_cost_basis = total(holdings.iter().map(|h| h.cost_basis));
        let total_market_value = total(holdings.iter().map(|h| h.market_value));
        let total_gain = total_market_value.saturating_sub(total_cost_basis);

        PortfolioSummary {
            holdings,
            total_cost_basis,
            total_market_value,
            total_gain,
            gain_pct: percent_of(total_gain, total_cost_basis),
        }
    }
}

/// Overall position of a user across accounts and investments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub account_count: usize,
    pub total_balance: i64,
    pub total_income: i64,
    pub total_expense: i64,
    pub investment_value: i64,
    pub net_worth: i64,
}

impl FinancialSummary {
    pub fn compute(accounts: &[Account], investments: &[Investment]) -> Self {
        let total_balance = total(accounts.iter().map(|a| a.balance));
        let investment_value = total(investments.iter().map(|i| i.market_value()));

        FinancialSummary {
            account_count: accounts.len(),
            total_balance,
            total_income: total(accounts.iter().map(|a| a.total_income)),
            total_expense: total(accounts.iter().map(|a| a.total_expense)),
            investment_value,
            net_worth: total_balance.saturating_add(investment_value),
        }
    }
}

/// Income and expense within one calendar month (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    pub income: i64,
    pub expense: i64,
    pub net: i64,
}

/// First instant of the oldest month in a window of `months` ending at `now`
pub fn month_window_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let (year, month) = shift_month(now.year(), now.month(), months.saturating_sub(1));
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Move back `back` months from (year, month)
fn shift_month(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Bucket transactions into the `months` calendar months ending with `now`'s
/// month. Oldest month first; months without activity are zero buckets.
/// Transactions outside the window are ignored.
pub fn monthly_series(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    months: u32,
) -> Vec<MonthlyBucket> {
    let months = months.max(1);
    let mut buckets: Vec<MonthlyBucket> = (0..months)
        .rev()
        .map(|back| {
            let (y, m) = shift_month(now.year(), now.month(), back);
            MonthlyBucket {
                month: format!("{:04}-{:02}", y, m),
                income: 0,
                expense: 0,
                net: 0,
            }
        })
        .collect();

    for tx in transactions {
        let label = format!("{:04}-{:02}", tx.occurred_at.year(), tx.occurred_at.month());
        if let Some(bucket) = buckets.iter_mut().find(|b| b.month == label) {
            match tx.kind {
                TransactionKind::Income => bucket.income = bucket.income.saturating_add(tx.amount),
                TransactionKind::Expense => {
                    bucket.expense = bucket.expense.saturating_add(tx.amount)
                }
            }
        }
    }

    for bucket in &mut buckets {
        bucket.net = bucket.income.saturating_sub(bucket.expense);
    }

    buckets
}
