//! Investment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::InvestmentInput;
use crate::domain::entities::{
    Investment, InvestmentId, InvestmentKind, InvestmentUpdate, PortfolioSummary, User,
};
use crate::error::AppError;
use crate::AppState;

/// Investment with its valuation. Prices and values are minor units.
#[derive(Debug, Serialize)]
pub struct InvestmentResponse {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub kind: InvestmentKind,
    pub quantity: f64,
    pub cost_basis: i64,
    pub current_price: i64,
    pub market_value: i64,
    pub gain: i64,
    pub gain_pct: f64,
    pub currency: String,
    pub purchased_at: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Investment> for InvestmentResponse {
    fn from(inv: Investment) -> Self {
        InvestmentResponse {
            market_value: inv.market_value(),
            gain: inv.gain(),
            gain_pct: inv.gain_pct(),
            id: inv.id.to_string(),
            symbol: inv.symbol,
            name: inv.name,
            kind: inv.kind,
            quantity: inv.quantity,
            cost_basis: inv.cost_basis,
            current_price: inv.current_price,
            currency: inv.currency,
            purchased_at: inv.purchased_at.to_rfc3339(),
            notes: inv.notes,
            created_at: inv.created_at.to_rfc3339(),
            updated_at: inv.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvestmentRequest {
    pub symbol: String,
    /// Defaults to the symbol
    pub name: Option<String>,
    pub kind: InvestmentKind,
    pub quantity: f64,
    /// Total paid for the position
    pub cost_basis: i64,
    /// Per unit; defaults to cost basis / quantity
    pub current_price: Option<i64>,
    pub currency: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvestmentRequest {
    pub name: Option<String>,
    pub kind: Option<InvestmentKind>,
    pub quantity: Option<f64>,
    pub cost_basis: Option<i64>,
    pub current_price: Option<i64>,
    pub purchased_at: Option<DateTime<Utc>>,
    /// `null` clears the notes
    #[serde(default, deserialize_with = "super::double_option")]
    pub notes: Option<Option<String>>,
}

impl From<UpdateInvestmentRequest> for InvestmentUpdate {
    fn from(r: UpdateInvestmentRequest) -> Self {
        InvestmentUpdate {
            name: r.name,
            kind: r.kind,
            quantity: r.quantity,
            cost_basis: r.cost_basis,
            current_price: r.current_price,
            purchased_at: r.purchased_at,
            notes: r.notes,
        }
    }
}

/// GET /investments
pub async fn list_investments(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<InvestmentResponse>>, AppError> {
    let investments = state.investment_service.list(&user.id).await?;
    Ok(Json(investments.into_iter().map(Into::into).collect()))
}

/// POST /investments
pub async fn create_investment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<InvestmentResponse>), AppError> {
    let input = InvestmentInput {
        symbol: request.symbol,
        name: request.name,
        kind: request.kind,
        quantity: request.quantity,
        cost_basis: request.cost_basis,
        current_price: request.current_price,
        currency: request.currency,
        purchased_at: request.purchased_at,
        notes: request.notes,
    };

    let investment = state.investment_service.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(investment.into())))
}

/// GET /investments/:id
pub async fn get_investment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvestmentResponse>, AppError> {
    let investment = state
        .investment_service
        .get(&user.id, &InvestmentId(id))
        .await?;
    Ok(Json(investment.into()))
}

/// PATCH /investments/:id
pub async fn update_investment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInvestmentRequest>,
) -> Result<Json<InvestmentResponse>, AppError> {
    let investment = state
        .investment_service
        .update(&user.id, &InvestmentId(id), request.into())
        .await?;
    Ok(Json(investment.into()))
}

/// DELETE /investments/:id
pub async fn delete_investment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .investment_service
        .delete(&user.id, &InvestmentId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /portfolio
pub async fn get_portfolio(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<PortfolioSummary>, AppError> {
    Ok(Json(state.investment_service.portfolio(&user.id).await?))
}
