//! Account API handlers
//!
//! Handles endpoints related to account management:
//! - Create account
//! - Get account details
//! - Get the point balance
//! - Buy points (top-up)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::account::{Account, PointsBalance};
use common::points::Points;
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;
use crate::api::response::ApiResponse;

/// Create account request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Name shown on listings and comments
    pub display_name: String,
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account successfully created"),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<ApiResponse<Account>, ApiError> {
    let account = state.ledger.create_account(&request.display_name).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(account))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account details retrieved successfully"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Account>, ApiError> {
    // Request the account from the ledger
    let account = state.ledger.get_account(id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", id)))?;

    Ok(ApiResponse::new(account))
}

/// Get the point balance for an account
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/balance",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<PointsBalance>, ApiError> {
    // Verify the account exists before fetching the balance
    let _ = state.ledger.get_account(id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", id)))?;

    // An account that never topped up simply has a zero balance
    let balance = state.ledger.get_balance(id).await
        .map_err(ApiError::Common)?
        .unwrap_or_else(|| PointsBalance::new(id));

    Ok(ApiResponse::new(balance))
}

/// Top-up request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TopUpRequest {
    /// Purchased point amount
    pub amount: Points,
}

/// Buy points for an account
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{id}/top-up",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = TopUpRequest,
    responses(
        (status = 200, description = "Points granted successfully"),
        (status = 404, description = "Account not found"),
        (status = 400, description = "Invalid top-up request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<TopUpRequest>,
) -> Result<ApiResponse<PointsBalance>, ApiError> {
    // Call the ledger to grant the purchased points
    let balance = state.ledger.top_up(id, request.amount).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(balance))
}
