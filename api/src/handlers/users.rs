//! User handlers
//!
//! Registration and the caller's own profile.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::domain::entities::User;
use crate::error::AppError;
use crate::AppState;

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    /// ISO currency code used for new accounts, defaults to USD
    pub default_currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub default_currency: String,
    pub created_at: String,
    pub last_seen_at: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            name: user.name,
            email: user.email,
            default_currency: user.default_currency,
            created_at: user.created_at.to_rfc3339(),
            last_seen_at: user.last_seen_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Response body for user registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    /// Send as `Authorization: Bearer <api_key>`
    pub api_key: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub default_currency: Option<String>,
}

/// POST /users/register
///
/// Create a user. The API key is only returned here.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (user, api_key) = state
        .user_service
        .register(
            &request.name,
            &request.email,
            request.default_currency.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            api_key,
            message: "Save this API key now, it will not be shown again.".to_string(),
        }),
    ))
}

/// GET /me
pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(user.into())
}

/// PATCH /me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state
        .user_service
        .update_profile(
            &user.id,
            request.name.as_deref(),
            request.default_currency.as_deref(),
        )
        .await?;

    Ok(Json(updated.into()))
}
