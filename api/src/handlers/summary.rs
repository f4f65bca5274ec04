//! Summary handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::domain::entities::{FinancialSummary, MonthlyBucket, User};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    /// 1..=24, defaults to 6
    pub months: Option<u32>,
}

/// GET /summary
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<FinancialSummary>, AppError> {
    Ok(Json(state.summary_service.overview(&user.id).await?))
}

/// GET /summary/monthly?months=N
pub async fn get_monthly(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyBucket>>, AppError> {
    Ok(Json(
        state
            .summary_service
            .monthly(&user.id, query.months)
            .await?,
    ))
}
