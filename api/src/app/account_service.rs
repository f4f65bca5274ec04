//! Account service
//!
//! Account CRUD plus recalculation of the derived aggregates from history.

use std::sync::Arc;

use crate::app::cache_layer::CacheLayer;
use crate::app::validation;
use crate::domain::entities::{Account, AccountId, AccountKind, AccountUpdate, NewAccount, User, UserId};
use crate::domain::ports::{AccountRepository, CacheStore, TransactionRepository};
use crate::error::AppError;

/// Load an account and check it belongs to `user_id`
pub(crate) async fn owned_account<AR>(
    accounts: &AR,
    user_id: &UserId,
    id: &AccountId,
) -> Result<Account, AppError>
where
    AR: AccountRepository,
{
    let account = accounts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", id)))?;

    if !account.is_owned_by(user_id) {
        return Err(AppError::Forbidden);
    }

    Ok(account)
}

/// Service for managing accounts
pub struct AccountService<AR, TR, C>
where
    AR: AccountRepository,
    TR: TransactionRepository,
    C: CacheStore,
{
    accounts: Arc<AR>,
    transactions: Arc<TR>,
    cache: Arc<CacheLayer<C>>,
}

impl<AR, TR, C> AccountService<AR, TR, C>
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

    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Account>, AppError> {
        let key = self.cache.keys().user_accounts(user_id);
        self.cache
            .read_through(&key, || async {
                self.accounts
                    .find_by_user(user_id)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, user_id: &UserId, id: &AccountId) -> Result<Account, AppError> {
        let key = self.cache.keys().account(id);
        let account: Account = self
            .cache
            .read_through(&key, || async {
                self.accounts
                    .find_by_id(id)
                    .await
                    .map_err(AppError::from)
                    .and_then(|found| {
                        found.ok_or_else(|| {
                            AppError::NotFound(format!("Account {} not found", id))
                        })
                    })
            })
            .await?;

        if !account.is_owned_by(user_id) {
            return Err(AppError::Forbidden);
        }

        Ok(account)
    }

    /// Open an account. Currency falls back to the user's default.
    pub async fn create(
        &self,
        user: &User,
        name: &str,
        kind: AccountKind,
        currency: Option<&str>,
        opening_balance: Option<i64>,
    ) -> Result<Account, AppError> {
        let new_account = NewAccount {
            user_id: user.id,
            name: validation::text("name", name, 100)?,
            kind,
            currency: validation::currency(currency.unwrap_or(&user.default_currency))?,
            opening_balance: validation::signed_amount(
                "opening_balance",
                opening_balance.unwrap_or(0),
            )?,
        };

        let account = self.accounts.create(&new_account).await?;
        tracing::info!(user_id = %user.id, account_id = %account.id, "account created");

        self.cache
            .invalidate(self.cache.keys().on_account_create(&user.id))
            .await;

        Ok(account)
    }

    pub async fn update(
        &self,
        user_id: &UserId,
        id: &AccountId,
        name: Option<&str>,
        kind: Option<AccountKind>,
    ) -> Result<Account, AppError> {
        if name.is_none() && kind.is_none() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let update = AccountUpdate {
            name: name.map(|n| validation::text("name", n, 100)).transpose()?,
            kind,
        };

        owned_account(self.accounts.as_ref(), user_id, id).await?;
        let account = self.accounts.update(id, &update).await?;

        self.cache
            .invalidate(self.cache.keys().on_account_write(user_id, id))
            .await;

        Ok(account)
    }

    /// Delete an account and every transaction recorded against it
    pub async fn delete(&self, user_id: &UserId, id: &AccountId) -> Result<(), AppError> {
        owned_account(self.accounts.as_ref(), user_id, id).await?;
        self.accounts.delete(id).await?;
        tracing::info!(user_id = %user_id, account_id = %id, "account deleted");

        let keys = self.cache.keys();
        self.cache.invalidate(keys.on_account_delete(user_id, id)).await;
        self.cache
            .invalidate_matching(&keys.monthly_pattern(user_id))
            .await;

        Ok(())
    }

    /// Rebuild income, expense and balance from the account's transactions
    pub async fn recalculate(&self, user_id: &UserId, id: &AccountId) -> Result<Account, AppError> {
        owned_account(self.accounts.as_ref(), user_id, id).await?;
        let (before, account) = self.transactions.recalculate_account(id).await?;

        if before.balance != account.balance
            || before.total_income != account.total_income
            || before.total_expense != account.total_expense
        {
            tracing::warn!(
                account_id = %id,
                stored_balance = before.balance,
                recalculated_balance = account.balance,
                "account aggregates drifted, corrected"
            );
        }

        self.cache
            .invalidate(self.cache.keys().on_account_write(user_id, id))
            .await;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;

    use crate::domain::entities::{NewTransaction, TransactionKind, MAX_AMOUNT};
    use crate::test_utils::{
        test_account, test_account_with_balance, test_transaction, test_user,
        InMemoryAccountRepository, InMemoryCache, InMemoryTransactionRepository,
    };

    type Service =
        AccountService<InMemoryAccountRepository, InMemoryTransactionRepository, InMemoryCache>;

    struct Harness {
        service: Service,
        accounts: Arc<InMemoryAccountRepository>,
        transactions: Arc<InMemoryTransactionRepository>,
        cache: Arc<InMemoryCache>,
    }

    fn harness(accounts: InMemoryAccountRepository) -> Harness {
        let transactions = Arc::new(InMemoryTransactionRepository::new(&accounts));
        let accounts = Arc::new(accounts);
        let cache = Arc::new(InMemoryCache::new());
        let layer = Arc::new(CacheLayer::new(
            cache.clone(),
            "test",
            Duration::from_secs(60),
        ));

        Harness {
            service: AccountService::new(accounts.clone(), transactions.clone(), layer),
            accounts,
            transactions,
            cache,
        }
    }

    #[tokio::test]
    async fn create_uses_user_currency_and_opening_balance() {
        let user = test_user();
        let h = harness(InMemoryAccountRepository::new());

        let account = h
            .service
            .create(&user, "Savings", AccountKind::Savings, None, Some(50_000))
            .await
            .unwrap();

        assert_eq!(account.currency, "USD");
        assert_eq!(account.balance, 50_000);
        assert!(account.is_consistent());
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let user = test_user();
        let h = harness(InMemoryAccountRepository::new());

        assert!(h
            .service
            .create(&user, "  ", AccountKind::Cash, None, None)
            .await
            .is_err());
        assert!(h
            .service
            .create(&user, "Wallet", AccountKind::Cash, Some("EURO"), None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn create_rejects_oversized_opening_balance() {
        let user = test_user();
        let h = harness(InMemoryAccountRepository::new());

        for balance in [i64::MAX, i64::MIN, MAX_AMOUNT + 1] {
            let err = h
                .service
                .create(&user, "Huge", AccountKind::Savings, None, Some(balance))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert!(h.service.list(&user.id).await.unwrap().is_empty());

        let account = h
            .service
            .create(&user, "Big", AccountKind::Savings, None, Some(-MAX_AMOUNT))
            .await
            .unwrap();
        assert_eq!(account.balance, -MAX_AMOUNT);
    }

    #[tokio::test]
    async fn list_is_served_from_cache_until_a_write() {
        let user = test_user();
        let h = harness(InMemoryAccountRepository::new().with_account(test_account(user.id)));

        assert_eq!(h.service.list(&user.id).await.unwrap().len(), 1);
        assert_eq!(h.service.list(&user.id).await.unwrap().len(), 1);
        assert_eq!(h.accounts.reads(), 1);

        h.service
            .create(&user, "Second", AccountKind::Cash, None, None)
            .await
            .unwrap();

        assert_eq!(h.service.list(&user.id).await.unwrap().len(), 2);
        assert_eq!(h.accounts.reads(), 2);
    }

    #[tokio::test]
    async fn get_checks_ownership() {
        let owner = test_user();
        let account = test_account(owner.id);
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));

        let err = h.service.get(&UserId::new(), &account.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let found = h.service.get(&owner.id, &account.id).await.unwrap();
        assert_eq!(found.id, account.id);
    }

    #[tokio::test]
    async fn get_ownership_still_enforced_on_cache_hit() {
        let owner = test_user();
        let account = test_account(owner.id);
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));

        h.service.get(&owner.id, &account.id).await.unwrap();
        let err = h.service.get(&UserId::new(), &account.id).await.unwrap_err();

        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn get_missing_account() {
        let h = harness(InMemoryAccountRepository::new());

        let err = h
            .service
            .get(&UserId::new(), &AccountId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_invalidates_cached_account() {
        let user = test_user();
        let account = test_account(user.id);
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));

        h.service.get(&user.id, &account.id).await.unwrap();
        h.service
            .update(&user.id, &account.id, Some("Renamed"), None)
            .await
            .unwrap();

        let fresh = h.service.get(&user.id, &account.id).await.unwrap();
        assert_eq!(fresh.name, "Renamed");
    }

    #[tokio::test]
    async fn update_requires_fields_and_ownership() {
        let user = test_user();
        let account = test_account(user.id);
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));

        let err = h
            .service
            .update(&user.id, &account.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = h
            .service
            .update(&UserId::new(), &account.id, Some("Mine now"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn delete_cascades_and_clears_cache() {
        let user = test_user();
        let account = test_account(user.id);
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));
        h.transactions
            .create(&NewTransaction {
                account_id: account.id,
                user_id: user.id,
                kind: TransactionKind::Income,
                amount: 1_000,
                category: "salary".to_string(),
                description: None,
                occurred_at: Utc::now(),
            })
            .await
            .unwrap();
        h.service.list(&user.id).await.unwrap();
        h.cache.insert_persistent(&format!("test:user:{}:monthly:6", user.id), "[]");

        h.service.delete(&user.id, &account.id).await.unwrap();

        assert!(h.cache.keys().is_empty());
        assert!(h.service.list(&user.id).await.unwrap().is_empty());
        assert_eq!(h.transactions.totals(&account.id).income, 0);
    }

    #[tokio::test]
    async fn recalculate_repairs_drift() {
        let user = test_user();
        let account = test_account_with_balance(user.id, 1_000);
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));
        h.transactions.insert_raw(test_transaction(
            &account,
            TransactionKind::Income,
            500,
            Utc::now(),
        ));
        h.transactions.insert_raw(test_transaction(
            &account,
            TransactionKind::Expense,
            200,
            Utc::now(),
        ));
        h.accounts.corrupt(&account.id, 42);

        let fixed = h.service.recalculate(&user.id, &account.id).await.unwrap();

        assert_eq!(fixed.total_income, 500);
        assert_eq!(fixed.total_expense, 200);
        assert_eq!(fixed.balance, 1_300);
        assert!(fixed.is_consistent());
    }

    #[tokio::test]
    async fn recalculate_rejects_foreign_account() {
        let account = test_account(UserId::new());
        let h = harness(InMemoryAccountRepository::new().with_account(account.clone()));

        let err = h
            .service
            .recalculate(&UserId::new(), &account.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden));
    }
}
