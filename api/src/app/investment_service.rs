//! Investment service

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::app::cache_layer::CacheLayer;
use crate::app::validation;
use crate::domain::entities::{
    Investment, InvestmentId, InvestmentKind, InvestmentUpdate, NewInvestment, PortfolioSummary,
    User, UserId,
};
use crate::domain::ports::{CacheStore, InvestmentRepository};
use crate::error::AppError;

const MAX_NOTES_LEN: usize = 1000;

/// Fields accepted when recording a holding
#[derive(Debug, Clone)]
pub struct InvestmentInput {
    pub symbol: String,
    pub name: Option<String>,
    pub kind: InvestmentKind,
    pub quantity: f64,
    pub cost_basis: i64,
    pub current_price: Option<i64>,
    pub currency: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

pub struct InvestmentService<IR, C>
where
    IR: InvestmentRepository,
    C: CacheStore,
{
    investments: Arc<IR>,
    cache: Arc<CacheLayer<C>>,
}

impl<IR, C> InvestmentService<IR, C>
where
    IR: InvestmentRepository,
    C: CacheStore,
{
    pub fn new(investments: Arc<IR>, cache: Arc<CacheLayer<C>>) -> Self {
        Self { investments, cache }
    }

    pub async fn list(&self, user_id: &UserId) -> Result<Vec<Investment>, AppError> {
        let key = self.cache.keys().user_investments(user_id);
        self.cache
            .read_through(&key, || async {
                self.investments
                    .find_by_user(user_id)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    pub async fn get(&self, user_id: &UserId, id: &InvestmentId) -> Result<Investment, AppError> {
        let key = self.cache.keys().investment(id);
        let investment: Investment = self
            .cache
            .read_through(&key, || async {
                self.investments
                    .find_by_id(id)
                    .await
                    .map_err(AppError::from)
                    .and_then(|found| {
                        found.ok_or_else(|| {
                            AppError::NotFound(format!("Investment {} not found", id))
                        })
                    })
            })
            .await?;

        if !investment.is_owned_by(user_id) {
            return Err(AppError::Forbidden);
        }

        Ok(investment)
    }

    /// Valuation of every holding, cached per user
    pub async fn portfolio(&self, user_id: &UserId) -> Result<PortfolioSummary, AppError> {
        let key = self.cache.keys().portfolio(user_id);
        self.cache
            .read_through(&key, || async {
                self.investments
                    .find_by_user(user_id)
                    .await
                    .map(|holdings| PortfolioSummary::from_investments(&holdings))
                    .map_err(AppError::from)
            })
            .await
    }

    /// Record a holding. Without a current price the position is valued at
    /// what was paid per unit.
    pub async fn create(&self, user: &User, input: InvestmentInput) -> Result<Investment, AppError> {
        let symbol = validation::symbol(&input.symbol)?;
        let quantity = validation::quantity(input.quantity)?;
        let cost_basis = validation::non_negative_amount("cost_basis", input.cost_basis)?;
        let current_price = match input.current_price {
            Some(price) => validation::non_negative_amount("current_price", price)?,
            None => (cost_basis as f64 / quantity).round() as i64,
        };

        let new_investment = NewInvestment {
            user_id: user.id,
            name: validation::text("name", input.name.as_deref().unwrap_or(&symbol), 100)?,
            symbol,
            kind: input.kind,
            quantity,
            cost_basis,
            current_price,
            currency: validation::currency(
                input.currency.as_deref().unwrap_or(&user.default_currency),
            )?,
            purchased_at: input.purchased_at.unwrap_or_else(Utc::now),
            notes: validation::optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?,
        };

        let investment = self.investments.create(&new_investment).await?;
        tracing::info!(
            user_id = %user.id,
            investment_id = %investment.id,
            symbol = %investment.symbol,
            "investment recorded"
        );

        self.cache
            .invalidate(self.cache.keys().on_investment_write(&user.id, &investment.id))
            .await;

        Ok(investment)
    }

    pub async fn update(
        &self,
        user_id: &UserId,
        id: &InvestmentId,
        update: InvestmentUpdate,
    ) -> Result<Investment, AppError> {
        if update.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let update = InvestmentUpdate {
            name: update
                .name
                .as_deref()
                .map(|n| validation::text("name", n, 100))
                .transpose()?,
            quantity: update.quantity.map(validation::quantity).transpose()?,
            cost_basis: update
                .cost_basis
                .map(|c| validation::non_negative_amount("cost_basis", c))
                .transpose()?,
            current_price: update
                .current_price
                .map(|p| validation::non_negative_amount("current_price", p))
                .transpose()?,
            notes: update
                .notes
                .map(|n| validation::optional_text("notes", n.as_deref(), MAX_NOTES_LEN))
                .transpose()?,
            ..update
        };

        self.require_owned(user_id, id).await?;
        let investment = self.investments.update(id, &update).await?;

        self.cache
            .invalidate(self.cache.keys().on_investment_write(user_id, id))
            .await;

        Ok(investment)
    }

    pub async fn delete(&self, user_id: &UserId, id: &InvestmentId) -> Result<(), AppError> {
        self.require_owned(user_id, id).await?;
        self.investments.delete(id).await?;
        tracing::info!(user_id = %user_id, investment_id = %id, "investment deleted");

        self.cache
            .invalidate(self.cache.keys().on_investment_write(user_id, id))
            .await;

        Ok(())
    }

    async fn require_owned(&self, user_id: &UserId, id: &InvestmentId) -> Result<(), AppError> {
        let investment = self
            .investments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Investment {} not found", id)))?;

        if !investment.is_owned_by(user_id) {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}
