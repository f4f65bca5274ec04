//! Transaction handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::TransactionInput;
use crate::domain::entities::{
    AccountId, Transaction, TransactionFilter, TransactionId, TransactionKind, TransactionUpdate,
    User, DEFAULT_PAGE_SIZE,
};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub account_id: String,
    pub kind: TransactionKind,
    pub amount: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        TransactionResponse {
            id: tx.id.to_string(),
            account_id: tx.account_id.to_string(),
            kind: tx.kind,
            amount: tx.amount,
            category: tx.category,
            description: tx.description,
            occurred_at: tx.occurred_at.to_rfc3339(),
            created_at: tx.created_at.to_rfc3339(),
            updated_at: tx.updated_at.to_rfc3339(),
        }
    }
}

fn to_responses(txs: Vec<Transaction>) -> Vec<TransactionResponse> {
    txs.into_iter().map(Into::into).collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub kind: TransactionKind,
    /// Positive amount in minor units
    pub amount: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Defaults to now
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// Move the transaction to another account in the same currency
    pub account_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub amount: Option<i64>,
    pub category: Option<String>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl From<UpdateTransactionRequest> for TransactionUpdate {
    fn from(r: UpdateTransactionRequest) -> Self {
        TransactionUpdate {
            account_id: r.account_id.map(AccountId),
            kind: r.kind,
            amount: r.amount,
            category: r.category,
            description: r.description,
            occurred_at: r.occurred_at,
        }
    }
}

/// Query parameters for searching transactions
///
/// `from` is inclusive, `to` exclusive.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub account_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl From<ListTransactionsQuery> for TransactionFilter {
    fn from(q: ListTransactionsQuery) -> Self {
        TransactionFilter {
            account_id: q.account_id.map(AccountId),
            kind: q.kind,
            category: q.category.map(|c| c.trim().to_lowercase()),
            from: q.from,
            to: q.to,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

/// GET /accounts/:id/transactions
///
/// Most recent transactions of one account.
pub async fn list_account_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let txs = state
        .transaction_service
        .list_for_account(&user.id, &AccountId(account_id))
        .await?;
    Ok(Json(to_responses(txs)))
}

/// POST /accounts/:id/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let input = TransactionInput {
        kind: request.kind,
        amount: request.amount,
        category: request.category,
        description: request.description,
        occurred_at: request.occurred_at,
    };

    let tx = state
        .transaction_service
        .create(&user.id, &AccountId(account_id), input)
        .await?;

    Ok((StatusCode::CREATED, Json(tx.into())))
}

/// GET /transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let txs = state
        .transaction_service
        .list(&user.id, &query.into())
        .await?;
    Ok(Json(to_responses(txs)))
}

/// GET /transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, AppError> {
    let tx = state
        .transaction_service
        .get(&user.id, &TransactionId(id))
        .await?;
    Ok(Json(tx.into()))
}

/// PATCH /transactions/:id
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let tx = state
        .transaction_service
        .update(&user.id, &TransactionId(id), request.into())
        .await?;
    Ok(Json(tx.into()))
}

/// DELETE /transactions/:id
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .transaction_service
        .delete(&user.id, &TransactionId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
