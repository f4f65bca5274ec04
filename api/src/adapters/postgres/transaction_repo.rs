//! PostgreSQL adapter for TransactionRepository
//!
//! Every mutation runs inside one database transaction that writes the row
//! and moves the owning account's aggregates with in-place arithmetic
//! (`balance = balance + $delta`), so concurrent writers never lose updates.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Alias, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    Account, AccountId, LedgerEffect, LedgerTotals, NewTransaction, Transaction, TransactionFilter,
    TransactionId, TransactionKind, TransactionUpdate, UserId,
};
use crate::domain::ports::TransactionRepository;
use crate::entity::{accounts, transactions};
use crate::error::DomainError;

/// PostgreSQL implementation of TransactionRepository
pub struct PostgresTransactionRepository {
    db: DatabaseConnection,
}

impl PostgresTransactionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Move an account's aggregates by `effect`
async fn apply_effect<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    effect: &LedgerEffect,
) -> Result<(), DomainError> {
    if effect.is_zero() {
        return Ok(());
    }

    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(effect.balance_delta),
        )
        .col_expr(
            accounts::Column::TotalIncome,
            Expr::col(accounts::Column::TotalIncome).add(effect.income_delta),
        )
        .col_expr(
            accounts::Column::TotalExpense,
            Expr::col(accounts::Column::TotalExpense).add(effect.expense_delta),
        )
        .col_expr(
            accounts::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(accounts::Column::Id.eq(account_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound(format!(
            "Account {} not found",
            account_id
        )));
    }

    Ok(())
}

async fn find_locked<C: ConnectionTrait>(
    conn: &C,
    id: &TransactionId,
) -> Result<Transaction, DomainError> {
    transactions::Entity::find_by_id(id.0)
        .lock_exclusive()
        .one(conn)
        .await?
        .map(Transaction::from)
        .ok_or_else(|| DomainError::NotFound(format!("Transaction {} not found", id)))
}

/// Income and expense sums over every transaction of an account
async fn sum_by_kind<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
) -> Result<LedgerTotals, DomainError> {
    // SUM(bigint) is NUMERIC in Postgres
    let rows: Vec<(String, Option<i64>)> = transactions::Entity::find()
        .select_only()
        .column(transactions::Column::Kind)
        .column_as(
            Expr::col(transactions::Column::Amount)
                .sum()
                .cast_as(Alias::new("BIGINT")),
            "total",
        )
        .filter(transactions::Column::AccountId.eq(account_id))
        .group_by(transactions::Column::Kind)
        .into_tuple()
        .all(conn)
        .await?;

    let mut totals = LedgerTotals::default();
    for (kind, total) in rows {
        match kind.parse::<TransactionKind>() {
            Ok(TransactionKind::Income) => totals.income = total.unwrap_or(0),
            Ok(TransactionKind::Expense) => totals.expense = total.unwrap_or(0),
            Err(e) => return Err(DomainError::Internal(e)),
        }
    }

    Ok(totals)
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, DomainError> {
        let result = transactions::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_account(
        &self,
        account_id: &AccountId,
        limit: u64,
    ) -> Result<Vec<Transaction>, DomainError> {
        let results = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.0))
            .order_by_desc(transactions::Column::OccurredAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, DomainError> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id.0));

        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id.0));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.to_string()));
        }
        if let Some(category) = &filter.category {
            query = query.filter(transactions::Column::Category.eq(category.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredAt.gte(from.fixed_offset()));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredAt.lt(to.fixed_offset()));
        }

        let results = query
            .order_by_desc(transactions::Column::OccurredAt)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn recalculate_account(
        &self,
        account_id: &AccountId,
    ) -> Result<(Account, Account), DomainError> {
        let txn = self.db.begin().await?;

        // Mutations move this row too, so they queue behind the lock
        let locked = accounts::Entity::find_by_id(account_id.0)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Account {} not found", account_id)))?;
        let before = Account::from(locked.clone());

        let totals = sum_by_kind(&txn, account_id.0).await?;
        let mut expected = before.clone();
        expected.reset_to(&totals);

        let mut model = locked.into_active_model();
        model.total_income = Set(expected.total_income);
        model.total_expense = Set(expected.total_expense);
        model.balance = Set(expected.balance);
        model.updated_at = Set(Utc::now().fixed_offset());
        let after = model.update(&txn).await?;

        txn.commit().await?;
        Ok((before, after.into()))
    }

    async fn create(&self, tx: &NewTransaction) -> Result<Transaction, DomainError> {
        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;

        let model = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(tx.account_id.0),
            user_id: Set(tx.user_id.0),
            kind: Set(tx.kind.to_string()),
            amount: Set(tx.amount),
            category: Set(tx.category.clone()),
            description: Set(tx.description.clone()),
            occurred_at: Set(tx.occurred_at.fixed_offset()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        apply_effect(&txn, tx.account_id.0, &LedgerEffect::of(tx.kind, tx.amount)).await?;

        txn.commit().await?;
        Ok(model.into())
    }

    async fn update(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(Transaction, AccountId), DomainError> {
        let txn = self.db.begin().await?;

        let current = find_locked(&txn, id).await?;
        let next = update.apply_to(&current);

        let revert = LedgerEffect::of_transaction(&current).reversed();
        let apply = LedgerEffect::of_transaction(&next);
        if current.account_id == next.account_id {
            apply_effect(&txn, next.account_id.0, &revert.combine(&apply)).await?;
        } else {
            apply_effect(&txn, current.account_id.0, &revert).await?;
            apply_effect(&txn, next.account_id.0, &apply).await?;
        }

        let model = transactions::ActiveModel {
            id: Set(next.id.0),
            account_id: Set(next.account_id.0),
            kind: Set(next.kind.to_string()),
            amount: Set(next.amount),
            category: Set(next.category.clone()),
            description: Set(next.description.clone()),
            occurred_at: Set(next.occurred_at.fixed_offset()),
            updated_at: Set(next.updated_at.fixed_offset()),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        txn.commit().await?;
        Ok((model.into(), current.account_id))
    }

    async fn delete(&self, id: &TransactionId) -> Result<Transaction, DomainError> {
        let txn = self.db.begin().await?;

        let current = find_locked(&txn, id).await?;

        transactions::Entity::delete_by_id(id.0).exec(&txn).await?;
        apply_effect(
            &txn,
            current.account_id.0,
            &LedgerEffect::of_transaction(&current).reversed(),
        )
        .await?;

        txn.commit().await?;
        Ok(current)
    }
}

/// Convert SeaORM model to domain entity
impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Transaction {
            id: TransactionId(model.id),
            account_id: AccountId(model.account_id),
            user_id: UserId(model.user_id),
            kind: model.kind.parse().unwrap_or(TransactionKind::Expense),
            amount: model.amount,
            category: model.category,
            description: model.description,
            occurred_at: model.occurred_at.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
