//! Transaction service
//!
//! Records income and expenses. The repository applies each change to the
//! owning account's aggregates atomically; this service handles validation,
//! ownership and cache invalidation around it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::app::account_service::owned_account;
use crate::app::cache_layer::CacheLayer;
use crate::app::validation;
use crate::domain::entities::{
    AccountId, NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionKind,
    TransactionUpdate, UserId, DEFAULT_CATEGORY, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::domain::ports::{AccountRepository, CacheStore, TransactionRepository};
use crate::error::AppError;

const MAX_CATEGORY_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Fields accepted when recording a transaction
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub kind: TransactionKind,
    pub amount: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

fn category(value: &str) -> Result<String, AppError> {
    Ok(validation::text("category", value, MAX_CATEGORY_LEN)?.to_lowercase())
}

/// Service for managing transactions
pub struct TransactionService<AR, TR, C>
where
    AR: AccountRepository,
    TR: TransactionRepository,
    C: CacheStore,
{
    accounts: Arc<AR>,
    transactions: Arc<TR>,
    cache: Arc<CacheLayer<C>>,
}

impl<AR, TR, C> TransactionService<AR, TR, C>
where
    AR: AccountRepository,
    TR: TransactionRepository,
    C: CacheStore,
{
    pub fn new(accounts: Arc<AR>, transactions: Arc<TR>, cache: Arc<CacheLayer<C>>) -> Self {
        Self {
            accounts,
            transactions,
            cache,
        }
    }

    /// Most recent transactions of one account
    pub async fn list_for_account(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
    ) -> Result<Vec<Transaction>, AppError> {
        owned_account(self.accounts.as_ref(), user_id, account_id).await?;

        let key = self.cache.keys().account_transactions(account_id);
        self.cache
            .read_through(&key, || async {
                self.transactions
                    .find_by_account(account_id, DEFAULT_PAGE_SIZE)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    /// Search across all of the user's accounts. Not cached.
    pub async fn list(
        &self,
        user_id: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        if filter.limit == 0 || filter.limit > MAX_PAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from >= to {
                return Err(AppError::BadRequest("from must be before to".to_string()));
            }
        }
        if let Some(account_id) = &filter.account_id {
            owned_account(self.accounts.as_ref(), user_id, account_id).await?;
        }

        Ok(self.transactions.find_by_user(user_id, filter).await?)
    }

    pub async fn get(&self, user_id: &UserId, id: &TransactionId) -> Result<Transaction, AppError> {
        let tx = self
            .transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        if !tx.is_owned_by(user_id) {
            return Err(AppError::Forbidden);
        }

        Ok(tx)
    }

    pub async fn create(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        input: TransactionInput,
    ) -> Result<Transaction, AppError> {
        owned_account(self.accounts.as_ref(), user_id, account_id).await?;

        let new_tx = NewTransaction {
            account_id: *account_id,
            user_id: *user_id,
            kind: input.kind,
            amount: validation::positive_amount("amount", input.amount)?,
            category: category(input.category.as_deref().unwrap_or(DEFAULT_CATEGORY))?,
            description: validation::optional_text(
                "description",
                input.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
            occurred_at: input.occurred_at.unwrap_or_else(Utc::now),
        };

        let tx = self.transactions.create(&new_tx).await?;
        tracing::debug!(
            user_id = %user_id,
            account_id = %account_id,
            transaction_id = %tx.id,
            kind = %tx.kind,
            amount = tx.amount,
            "transaction recorded"
        );

        self.invalidate(user_id, &[*account_id]).await;

        Ok(tx)
    }

    /// Change a transaction, possibly moving it to another of the user's
    /// accounts. Both accounts must use the same currency.
    pub async fn update(
        &self,
        user_id: &UserId,
        id: &TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, AppError> {
        if update.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let current = self.get(user_id, id).await?;

        let update = TransactionUpdate {
            amount: update
                .amount
                .map(|a| validation::positive_amount("amount", a))
                .transpose()?,
            category: update.category.as_deref().map(category).transpose()?,
            description: update
                .description
                .map(|d| {
                    validation::optional_text("description", d.as_deref(), MAX_DESCRIPTION_LEN)
                })
                .transpose()?,
            ..update
        };

        if let Some(target) = update.account_id.filter(|t| *t != current.account_id) {
            let source = owned_account(self.accounts.as_ref(), user_id, &current.account_id).await?;
            let target = owned_account(self.accounts.as_ref(), user_id, &target).await?;
            if source.currency != target.currency {
                return Err(AppError::BadRequest(format!(
                    "Cannot move a {} transaction to a {} account",
                    source.currency, target.currency
                )));
            }
        }

        let (updated, previous_account) = self.transactions.update(id, &update).await?;
        tracing::debug!(
            user_id = %user_id,
            transaction_id = %id,
            from_account = %previous_account,
            to_account = %updated.account_id,
            "transaction updated"
        );

        self.invalidate(user_id, &[previous_account, updated.account_id])
            .await;

        Ok(updated)
    }

    pub async fn delete(&self, user_id: &UserId, id: &TransactionId) -> Result<(), AppError> {
        self.get(user_id, id).await?;
        let removed = self.transactions.delete(id).await?;
        tracing::debug!(user_id = %user_id, transaction_id = %id, "transaction deleted");

        self.invalidate(user_id, &[removed.account_id]).await;

        Ok(())
    }

    async fn invalidate(&self, user_id: &UserId, accounts: &[AccountId]) {
        let keys = self.cache.keys();
        self.cache
            .invalidate(keys.on_transaction_write(user_id, accounts))
            .await;
        self.cache
            .invalidate_matching(&keys.monthly_pattern(user_id))
            .await;
    }
}
