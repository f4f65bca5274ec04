//! Summary service
//!
//! Cross-account aggregates: the overall financial position and the monthly
//! income/expense series. Both are cached per user.

use std::sync::Arc;

use chrono::Utc;

use crate::app::cache_layer::CacheLayer;
use crate::domain::entities::{
    month_window_start, monthly_series, FinancialSummary, MonthlyBucket, TransactionFilter,
    UserId, DEFAULT_MONTHS, MAX_MONTHS,
};
use crate::domain::ports::{
    AccountRepository, CacheStore, InvestmentRepository, TransactionRepository,
};
use crate::error::AppError;

/// Upper bound on rows pulled into one monthly series
const SERIES_ROW_LIMIT: u64 = 100_000;

pub struct SummaryService<AR, TR, IR, C>
where
    AR: AccountRepository,
    TR: TransactionRepository,
    IR: InvestmentRepository,
    C: CacheStore,
{
    accounts: Arc<AR>,
    transactions: Arc<TR>,
    investments: Arc<IR>,
    cache: Arc<CacheLayer<C>>,
}

impl<AR, TR, IR, C> SummaryService<AR, TR, IR, C>
where
    AR: AccountRepository,
    TR: TransactionRepository,
    IR: InvestmentRepository,
    C: CacheStore,
{
    pub fn new(
        accounts: Arc<AR>,
        transactions: Arc<TR>,
        investments: Arc<IR>,
        cache: Arc<CacheLayer<C>>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            investments,
            cache,
        }
    }

    pub async fn overview(&self, user_id: &UserId) -> Result<FinancialSummary, AppError> {
        let key = self.cache.keys().summary(user_id);
        self.cache
            .read_through(&key, || self.compute_overview(user_id))
            .await
    }

    /// Income and expense per calendar month, oldest first
    pub async fn monthly(
        &self,
        user_id: &UserId,
        months: Option<u32>,
    ) -> Result<Vec<MonthlyBucket>, AppError> {
        let months = months.unwrap_or(DEFAULT_MONTHS);
        if !(1..=MAX_MONTHS).contains(&months) {
            return Err(AppError::BadRequest(format!(
                "months must be between 1 and {}",
                MAX_MONTHS
            )));
        }

        let key = self.cache.keys().monthly(user_id, months);
        self.cache
            .read_through(&key, || self.compute_monthly(user_id, months))
            .await
    }

    async fn compute_overview(&self, user_id: &UserId) -> Result<FinancialSummary, AppError> {
        let accounts = self.accounts.find_by_user(user_id).await?;
        let investments = self.investments.find_by_user(user_id).await?;
        Ok(FinancialSummary::compute(&accounts, &investments))
    }

    async fn compute_monthly(
        &self,
        user_id: &UserId,
        months: u32,
    ) -> Result<Vec<MonthlyBucket>, AppError> {
        let now = Utc::now();
        let filter = TransactionFilter {
            from: Some(month_window_start(now, months)),
            limit: SERIES_ROW_LIMIT,
            ..Default::default()
        };

        let transactions = self.transactions.find_by_user(user_id, &filter).await?;
        if transactions.len() as u64 == SERIES_ROW_LIMIT {
            tracing::warn!(user_id = %user_id, months, "monthly series truncated");
        }

        Ok(monthly_series(&transactions, now, months))
    }
}
