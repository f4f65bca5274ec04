//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::domain::entities::{
    Account, AccountId, AccountUpdate, Investment, InvestmentId, InvestmentUpdate, NewAccount,
    NewInvestment, NewTransaction, NewUser, Transaction, TransactionFilter, TransactionId,
    TransactionUpdate, User, UserId, UserProfileUpdate,
};
use crate::error::DomainError;

/// Repository for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by (lowercased) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by API key hash
    async fn find_by_api_key_hash(&self, hash: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: &NewUser) -> Result<User, DomainError>;

    /// Update name and/or default currency
    async fn update_profile(
        &self,
        id: &UserId,
        update: &UserProfileUpdate,
    ) -> Result<User, DomainError>;

    /// Update the last seen timestamp
    async fn update_last_seen(&self, id: &UserId) -> Result<(), DomainError>;
}

/// Repository for Account entities
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// All accounts of a user, oldest first
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Account>, DomainError>;

    /// Create an account. Balance starts at the opening balance.
    async fn create(&self, account: &NewAccount) -> Result<Account, DomainError>;

    /// Update descriptive fields
    async fn update(&self, id: &AccountId, update: &AccountUpdate)
        -> Result<Account, DomainError>;

    /// Delete an account together with its transactions
    async fn delete(&self, id: &AccountId) -> Result<(), DomainError>;
}

/// Repository for Transaction entities
///
/// Mutations keep the owning accounts' derived aggregates in step with the
/// stored rows. Implementations must apply both in one atomic unit.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, DomainError>;

    /// Most recent transactions of an account
    async fn find_by_account(
        &self,
        account_id: &AccountId,
        limit: u64,
    ) -> Result<Vec<Transaction>, DomainError>;

    /// A user's transactions matching a filter, newest first
    async fn find_by_user(
        &self,
        user_id: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, DomainError>;

    /// Rebuild an account's income, expense and balance from its rows
    ///
    /// The account is locked for the whole read-sum-write, so concurrent
    /// mutations land either wholly before or wholly after it. Returns the
    /// account as it was and as it is now.
    async fn recalculate_account(
        &self,
        account_id: &AccountId,
    ) -> Result<(Account, Account), DomainError>;

    /// Record a transaction and apply its effect to the account
    async fn create(&self, tx: &NewTransaction) -> Result<Transaction, DomainError>;

    /// Change a transaction; reverts the old effect and applies the new one
    ///
    /// Also returns the account the row belonged to before the change, read
    /// under the same lock as the write.
    async fn update(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(Transaction, AccountId), DomainError>;

    /// Remove a transaction and revert its effect on the account
    async fn delete(&self, id: &TransactionId) -> Result<Transaction, DomainError>;
}

/// Repository for Investment entities
#[async_trait]
pub trait InvestmentRepository: Send + Sync {
    async fn find_by_id(&self, id: &InvestmentId) -> Result<Option<Investment>, DomainError>;

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Investment>, DomainError>;

    async fn create(&self, investment: &NewInvestment) -> Result<Investment, DomainError>;

    async fn update(
        &self,
        id: &InvestmentId,
        update: &InvestmentUpdate,
    ) -> Result<Investment, DomainError>;

    async fn delete(&self, id: &InvestmentId) -> Result<(), DomainError>;
}
