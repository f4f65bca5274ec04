//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::domain::entities::{
    Account, AccountId, AccountUpdate, Investment, InvestmentId, InvestmentUpdate, LedgerEffect,
    LedgerTotals, NewAccount, NewInvestment, NewTransaction, NewUser, Transaction,
    TransactionFilter, TransactionId, TransactionUpdate, User, UserId, UserProfileUpdate,
};
use crate::domain::ports::{
    AccountRepository, CacheStore, InvestmentRepository, TransactionRepository, UserRepository,
};
use crate::error::{CacheError, DomainError};

// ============================================================================
// In-Memory User Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user for testing
    pub fn with_user(self, user: User) -> Self {
        self.users.write().unwrap().insert(user.id, user);
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.api_key_hash == hash).cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(DomainError::AlreadyExists(format!(
                "User with email '{}' already exists",
                new_user.email
            )));
        }

        let user = User {
            id: UserId::new(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            api_key_hash: new_user.api_key_hash.clone(),
            default_currency: new_user.default_currency.clone(),
            created_at: Utc::now(),
            last_seen_at: None,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut users = self.users.write().unwrap();
        let user = users
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?;

        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(currency) = &update.default_currency {
            user.default_currency = currency.clone();
        }

        Ok(user.clone())
    }

    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(id) {
            user.last_seen_at = Some(Utc::now());
        }
        Ok(())
    }
}

// ============================================================================
// In-Memory Account Repository
// ============================================================================

/// Accounts and the ledger rows behind them
///
/// The transaction store lives here as well so that deleting an account can
/// cascade, and so that `InMemoryTransactionRepository` can apply effects to
/// the same accounts a service reads back.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
    reads: Arc<AtomicUsize>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an account for testing
    pub fn with_account(self, account: Account) -> Self {
        self.accounts.write().unwrap().insert(account.id, account);
        self
    }

    /// Number of `find_by_id`/`find_by_user` calls served
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Current stored state, bypassing the counters
    pub fn snapshot(&self, id: &AccountId) -> Option<Account> {
        self.accounts.read().unwrap().get(id).cloned()
    }

    /// Overwrite aggregates directly to simulate drift
    pub fn corrupt(&self, id: &AccountId, balance: i64) {
        if let Some(account) = self.accounts.write().unwrap().get_mut(id) {
            account.balance = balance;
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.read().unwrap().get(id).cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Account>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.read().unwrap();
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|a| a.user_id == *user_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.created_at);
        Ok(result)
    }

    async fn create(&self, new_account: &NewAccount) -> Result<Account, DomainError> {
        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            user_id: new_account.user_id,
            name: new_account.name.clone(),
            kind: new_account.kind,
            currency: new_account.currency.clone(),
            opening_balance: new_account.opening_balance,
            balance: new_account.opening_balance,
            total_income: 0,
            total_expense: 0,
            created_at: now,
            updated_at: now,
        };

        self.accounts
            .write()
            .unwrap()
            .insert(account.id, account.clone());

        Ok(account)
    }

    async fn update(
        &self,
        id: &AccountId,
        update: &AccountUpdate,
    ) -> Result<Account, DomainError> {
        let mut accounts = self.accounts.write().unwrap();
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Account {} not found", id)))?;

        if let Some(name) = &update.name {
            account.name = name.clone();
        }
        if let Some(kind) = update.kind {
            account.kind = kind;
        }
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().unwrap();
        let mut transactions = self.transactions.write().unwrap();

        if accounts.remove(id).is_none() {
            return Err(DomainError::NotFound(format!("Account {} not found", id)));
        }
        transactions.retain(|_, tx| tx.account_id != *id);

        Ok(())
    }
}

// ============================================================================
// In-Memory Transaction Repository
// ============================================================================

/// Shares storage with an `InMemoryAccountRepository`
///
/// Both maps are locked together for every mutation, so a mutation and its
/// ledger effect are applied atomically like the Postgres adapter does.
pub struct InMemoryTransactionRepository {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
}

impl InMemoryTransactionRepository {
    pub fn new(accounts: &InMemoryAccountRepository) -> Self {
        Self {
            accounts: accounts.accounts.clone(),
            transactions: accounts.transactions.clone(),
        }
    }

    /// Store a row without applying its ledger effect
    pub fn insert_raw(&self, tx: Transaction) {
        self.transactions.write().unwrap().insert(tx.id, tx);
    }

    /// Income and expense sums over the stored rows of an account
    pub fn totals(&self, account_id: &AccountId) -> LedgerTotals {
        let transactions = self.transactions.read().unwrap();
        LedgerTotals::from_transactions(
            transactions.values().filter(|tx| tx.account_id == *account_id),
        )
    }
}

fn apply_to_account(
    accounts: &mut HashMap<AccountId, Account>,
    id: &AccountId,
    effect: &LedgerEffect,
) -> Result<(), DomainError> {
    let account = accounts
        .get_mut(id)
        .ok_or_else(|| DomainError::NotFound(format!("Account {} not found", id)))?;
    account.apply(effect);
    account.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, DomainError> {
        Ok(self.transactions.read().unwrap().get(id).cloned())
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        limit: u64,
    ) -> Result<Vec<Transaction>, DomainError> {
        let transactions = self.transactions.read().unwrap();
        let mut result: Vec<Transaction> = transactions
            .values()
            .filter(|tx| tx.account_id == *account_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        result.truncate(limit as usize);
        Ok(result)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, DomainError> {
        let transactions = self.transactions.read().unwrap();
        let mut result: Vec<Transaction> = transactions
            .values()
            .filter(|tx| tx.user_id == *user_id && filter.matches(tx))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(result
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn recalculate_account(
        &self,
        account_id: &AccountId,
    ) -> Result<(Account, Account), DomainError> {
        let mut accounts = self.accounts.write().unwrap();
        let transactions = self.transactions.read().unwrap();

        let account = accounts.get_mut(account_id).ok_or_else(|| {
            DomainError::NotFound(format!("Account {} not found", account_id))
        })?;
        let before = account.clone();

        account.reset_to(&LedgerTotals::from_transactions(
            transactions.values().filter(|tx| tx.account_id == *account_id),
        ));
        account.updated_at = Utc::now();

        Ok((before, account.clone()))
    }

    async fn create(&self, new_tx: &NewTransaction) -> Result<Transaction, DomainError> {
        let mut accounts = self.accounts.write().unwrap();
        let mut transactions = self.transactions.write().unwrap();

        let now = Utc::now();
        let tx = Transaction {
            id: TransactionId::new(),
            account_id: new_tx.account_id,
            user_id: new_tx.user_id,
            kind: new_tx.kind,
            amount: new_tx.amount,
            category: new_tx.category.clone(),
            description: new_tx.description.clone(),
            occurred_at: new_tx.occurred_at,
            created_at: now,
            updated_at: now,
        };

        apply_to_account(
            &mut accounts,
            &tx.account_id,
            &LedgerEffect::of_transaction(&tx),
        )?;
        transactions.insert(tx.id, tx.clone());

        Ok(tx)
    }

    async fn update(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(Transaction, AccountId), DomainError> {
        let mut accounts = self.accounts.write().unwrap();
        let mut transactions = self.transactions.write().unwrap();

        let old = transactions
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Transaction {} not found", id)))?;
        let new = update.apply_to(&old);

        if !accounts.contains_key(&new.account_id) {
            return Err(DomainError::NotFound(format!(
                "Account {} not found",
                new.account_id
            )));
        }

        apply_to_account(
            &mut accounts,
            &old.account_id,
            &LedgerEffect::of_transaction(&old).reversed(),
        )?;
        apply_to_account(
            &mut accounts,
            &new.account_id,
            &LedgerEffect::of_transaction(&new),
        )?;
        transactions.insert(new.id, new.clone());

        Ok((new, old.account_id))
    }

    async fn delete(&self, id: &TransactionId) -> Result<Transaction, DomainError> {
        let mut accounts = self.accounts.write().unwrap();
        let mut transactions = self.transactions.write().unwrap();

        let old = transactions
            .remove(id)
            .ok_or_else(|| DomainError::NotFound(format!("Transaction {} not found", id)))?;

        apply_to_account(
            &mut accounts,
            &old.account_id,
            &LedgerEffect::of_transaction(&old).reversed(),
        )?;

        Ok(old)
    }
}

// ============================================================================
// In-Memory Investment Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryInvestmentRepository {
    investments: Arc<RwLock<HashMap<InvestmentId, Investment>>>,
    reads: Arc<AtomicUsize>,
}

impl InMemoryInvestmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an investment for testing
    pub fn with_investment(self, investment: Investment) -> Self {
        self.investments
            .write()
            .unwrap()
            .insert(investment.id, investment);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvestmentRepository for InMemoryInvestmentRepository {
    async fn find_by_id(&self, id: &InvestmentId) -> Result<Option<Investment>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.investments.read().unwrap().get(id).cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Investment>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let investments = self.investments.read().unwrap();
        let mut result: Vec<Investment> = investments
            .values()
            .filter(|i| i.user_id == *user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(result)
    }

    async fn create(&self, new_inv: &NewInvestment) -> Result<Investment, DomainError> {
        let now = Utc::now();
        let investment = Investment {
            id: InvestmentId::new(),
            user_id: new_inv.user_id,
            symbol: new_inv.symbol.clone(),
            name: new_inv.name.clone(),
            kind: new_inv.kind,
            quantity: new_inv.quantity,
            cost_basis: new_inv.cost_basis,
            current_price: new_inv.current_price,
            currency: new_inv.currency.clone(),
            purchased_at: new_inv.purchased_at,
            notes: new_inv.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        self.investments
            .write()
            .unwrap()
            .insert(investment.id, investment.clone());

        Ok(investment)
    }

    async fn update(
        &self,
        id: &InvestmentId,
        update: &InvestmentUpdate,
    ) -> Result<Investment, DomainError> {
        let mut investments = self.investments.write().unwrap();
        let current = investments
            .get(id)
            .ok_or_else(|| DomainError::NotFound(format!("Investment {} not found", id)))?;

        let updated = update.apply_to(current);
        investments.insert(updated.id, updated.clone());

        Ok(updated)
    }

    async fn delete(&self, id: &InvestmentId) -> Result<(), DomainError> {
        self.investments
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Investment {} not found", id)))
    }
}

// ============================================================================
// In-Memory Cache
// ============================================================================

struct CacheEntry {
    value: String,
    ttl: Option<Duration>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// TTL-aware cache with call counters
///
/// Like `RedisCache`, sweeps only look at keys under its own prefix.
pub struct InMemoryCache {
    prefix: String,
    entries: RwLock<HashMap<String, CacheEntry>>,
    sets: AtomicUsize,
    deletes: AtomicUsize,
    sweeps: AtomicUsize,
}

impl InMemoryCache {
    /// Cache owning the `test` namespace
    pub fn new() -> Self {
        Self::with_prefix("test")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            entries: RwLock::new(HashMap::new()),
            sets: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            sweeps: AtomicUsize::new(0),
        }
    }

    /// Store a key with no expiry, as a stray write from elsewhere would
    pub fn insert_persistent(&self, key: &str, value: &str) {
        self.entries.write().unwrap().insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                ttl: None,
                expires_at: None,
            },
        );
    }

    /// TTL the key was last written with
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.read().unwrap().get(key).and_then(|e| e.ttl)
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap()
            .get(key)
            .map_or(false, |e| !e.is_expired(now))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn sweep_calls(&self) -> usize {
        self.sweeps.load(Ordering::SeqCst)
    }
}

/// Glob match supporting `*` only, which is all the key patterns use
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[async_trait]
impl CacheStore for InMemoryCache {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.entries.write().unwrap().insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                ttl: Some(ttl),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().unwrap();
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count() as u64)
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|k, _| !glob_match(pattern, k));
        Ok((before - entries.len()) as u64)
    }

    async fn sweep(&self, default_ttl: Duration) -> Result<u64, CacheError> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let namespace = format!("{}:", self.prefix);
        let mut entries = self.entries.write().unwrap();

        // Expiry itself is the store's job, as it is for Redis
        entries.retain(|_, e| !e.is_expired(now));

        let mut fixed = 0;
        for (_, entry) in entries
            .iter_mut()
            .filter(|(k, e)| k.starts_with(&namespace) && e.expires_at.is_none())
        {
            entry.ttl = Some(default_ttl);
            entry.expires_at = Some(now + default_ttl);
            fixed += 1;
        }

        Ok(fixed)
    }
}

// ============================================================================
// Failing Cache
// ============================================================================

/// Cache whose every operation fails, for degradation tests
pub struct FailingCache;

fn unavailable() -> CacheError {
    CacheError::Connection("cache unavailable".to_string())
}

#[async_trait]
impl CacheStore for FailingCache {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(unavailable())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Err(unavailable())
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, CacheError> {
        Err(unavailable())
    }

    async fn sweep(&self, _default_ttl: Duration) -> Result<u64, CacheError> {
        Err(unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob_match("fv:user:1:monthly:*", "fv:user:1:monthly:6"));
        assert!(!glob_match("fv:user:1:monthly:*", "fv:user:2:monthly:6"));
        assert!(glob_match("fv:*", "fv:account:x"));
        assert!(glob_match("a*c*e", "abcde"));
        assert!(!glob_match("a*c*e", "abde"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", Duration::ZERO).await.unwrap();

        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_counts_only_prefixed_keys_it_gave_a_ttl() {
        let cache = InMemoryCache::with_prefix("fv");
        cache.insert_persistent("fv:persistent", "1");
        cache.insert_persistent("elsewhere:persistent", "1");
        cache.set("fv:stale", "2", Duration::ZERO).await.unwrap();
        cache.set("fv:fresh", "3", Duration::from_secs(60)).await.unwrap();

        let fixed = cache.sweep(Duration::from_secs(30)).await.unwrap();

        assert_eq!(fixed, 1);
        assert_eq!(cache.ttl_of("fv:persistent"), Some(Duration::from_secs(30)));
        assert_eq!(cache.ttl_of("elsewhere:persistent"), None);
        assert_eq!(
            cache.keys(),
            vec![
                "elsewhere:persistent".to_string(),
                "fv:fresh".to_string(),
                "fv:persistent".to_string(),
            ]
        );
    }
}
