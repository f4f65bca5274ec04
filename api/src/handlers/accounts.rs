//! Account handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{Account, AccountId, AccountKind, User};
use crate::error::AppError;
use crate::AppState;

/// Account with its derived aggregates. Amounts are minor units.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub opening_balance: i64,
    pub balance: i64,
    pub total_income: i64,
    pub total_expense: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        AccountResponse {
            id: a.id.to_string(),
            name: a.name,
            kind: a.kind,
            currency: a.currency,
            opening_balance: a.opening_balance,
            balance: a.balance,
            total_income: a.total_income,
            total_expense: a.total_expense,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub kind: AccountKind,
    /// Defaults to the user's default currency
    pub currency: Option<String>,
    pub opening_balance: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
}

/// GET /accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = state.account_service.list(&user.id).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// POST /accounts
pub async fn create_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let account = state
        .account_service
        .create(
            &user,
            &request.name,
            request.kind,
            request.currency.as_deref(),
            request.opening_balance,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state.account_service.get(&user.id, &AccountId(id)).await?;
    Ok(Json(account.into()))
}

/// PATCH /accounts/:id
pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .account_service
        .update(
            &user.id,
            &AccountId(id),
            request.name.as_deref(),
            request.kind,
        )
        .await?;

    Ok(Json(account.into()))
}

/// DELETE /accounts/:id
///
/// Also deletes every transaction of the account.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .account_service
        .delete(&user.id, &AccountId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /accounts/:id/recalculate
///
/// Rebuild balance and totals from the transaction history.
pub async fn recalculate_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .account_service
        .recalculate(&user.id, &AccountId(id))
        .await?;
    Ok(Json(account.into()))
}
