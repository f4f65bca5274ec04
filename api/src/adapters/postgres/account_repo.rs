//! PostgreSQL adapter for AccountRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    Account, AccountId, AccountKind, AccountUpdate, NewAccount, UserId,
};
use crate::domain::ports::AccountRepository;
use crate::entity::{accounts, transactions};
use crate::error::DomainError;

/// PostgreSQL implementation of AccountRepository
pub struct PostgresAccountRepository {
    db: DatabaseConnection,
}

impl PostgresAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn require(&self, id: &AccountId) -> Result<accounts::Model, DomainError> {
        accounts::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Account {} not found", id)))
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let result = accounts::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Account>, DomainError> {
        let results = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.0))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, account: &NewAccount) -> Result<Account, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(account.user_id.0),
            name: Set(account.name.clone()),
            kind: Set(account.kind.to_string()),
            currency: Set(account.currency.clone()),
            opening_balance: Set(account.opening_balance),
            balance: Set(account.opening_balance),
            total_income: Set(0),
            total_expense: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn update(
        &self,
        id: &AccountId,
        update: &AccountUpdate,
    ) -> Result<Account, DomainError> {
        let mut model = self.require(id).await?.into_active_model();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(kind) = update.kind {
            model.kind = Set(kind.to_string());
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        transactions::Entity::delete_many()
            .filter(transactions::Column::AccountId.eq(id.0))
            .exec(&txn)
            .await?;

        let result = accounts::Entity::delete_by_id(id.0).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Account {} not found", id)));
        }

        txn.commit().await?;
        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Account {
            id: AccountId(model.id),
            user_id: UserId(model.user_id),
            name: model.name,
            kind: model.kind.parse().unwrap_or(AccountKind::Other),
            currency: model.currency.trim().to_string(),
            opening_balance: model.opening_balance,
            balance: model.balance,
            total_income: model.total_income,
            total_expense: model.total_expense,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
