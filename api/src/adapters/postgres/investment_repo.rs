//! PostgreSQL adapter for InvestmentRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::entities::{
    Investment, InvestmentId, InvestmentKind, InvestmentUpdate, NewInvestment, UserId,
};
use crate::domain::ports::InvestmentRepository;
use crate::entity::investments;
use crate::error::DomainError;

/// PostgreSQL implementation of InvestmentRepository
pub struct PostgresInvestmentRepository {
    db: DatabaseConnection,
}

impl PostgresInvestmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InvestmentRepository for PostgresInvestmentRepository {
    async fn find_by_id(&self, id: &InvestmentId) -> Result<Option<Investment>, DomainError> {
        let result = investments::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Investment>, DomainError> {
        let results = investments::Entity::find()
            .filter(investments::Column::UserId.eq(user_id.0))
            .order_by_asc(investments::Column::Symbol)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create(&self, investment: &NewInvestment) -> Result<Investment, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = investments::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(investment.user_id.0),
            symbol: Set(investment.symbol.clone()),
            name: Set(investment.name.clone()),
            kind: Set(investment.kind.to_string()),
            quantity: Set(investment.quantity),
            cost_basis: Set(investment.cost_basis),
            current_price: Set(investment.current_price),
            currency: Set(investment.currency.clone()),
            purchased_at: Set(investment.purchased_at.fixed_offset()),
            notes: Set(investment.notes.clone()),
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
        id: &InvestmentId,
        update: &InvestmentUpdate,
    ) -> Result<Investment, DomainError> {
        let mut model = investments::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| DomainError::NotFound(format!("Investment {} not found", id)))?
            .into_active_model();

        if let Some(name) = &update.name {
            model.name = Set(name.clone());
        }
        if let Some(kind) = update.kind {
            model.kind = Set(kind.to_string());
        }
        if let Some(quantity) = update.quantity {
            model.quantity = Set(quantity);
        }
        if let Some(cost_basis) = update.cost_basis {
            model.cost_basis = Set(cost_basis);
        }
        if let Some(price) = update.current_price {
            model.current_price = Set(price);
        }
        if let Some(purchased_at) = update.purchased_at {
            model.purchased_at = Set(purchased_at.fixed_offset());
        }
        if let Some(notes) = &update.notes {
            model.notes = Set(notes.clone());
        }
        model.updated_at = Set(Utc::now().fixed_offset());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, id: &InvestmentId) -> Result<(), DomainError> {
        let result = investments::Entity::delete_by_id(id.0)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!(
                "Investment {} not found",
                id
            )));
        }

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl From<investments::Model> for Investment {
    fn from(model: investments::Model) -> Self {
        Investment {
            id: InvestmentId(model.id),
            user_id: UserId(model.user_id),
            symbol: model.symbol,
            name: model.name,
            kind: model.kind.parse().unwrap_or(InvestmentKind::Other),
            quantity: model.quantity,
            cost_basis: model.cost_basis,
            current_price: model.current_price,
            currency: model.currency.trim().to_string(),
            purchased_at: model.purchased_at.with_timezone(&Utc),
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
