//! Moderation API handlers
//!
//! Staff endpoints for the flag queue.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::moderation::Flag;
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;
use crate::api::response::{ApiResponse, ApiListResponse};

/// Get all open flags
#[utoipa::path(
    get,
    path = "/api/v1/moderation/flags",
    responses(
        (status = 200, description = "Open flags retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "moderation"
)]
pub async fn get_flags(
    State(state): State<Arc<AppState>>,
) -> Result<ApiListResponse<Flag>, ApiError> {
    let flags = state.listings.open_flags().await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(flags))
}

/// Resolve flag request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveFlagRequest {
    /// Resolving staff account ID
    pub staff_id: Uuid,
    /// True to uphold the flag and remove the listing
    pub uphold: bool,
}

/// Resolve a flag (staff only); upholding removes the listing
#[utoipa::path(
    post,
    path = "/api/v1/moderation/flags/{id}/resolve",
    params(
        ("id" = Uuid, Path, description = "Flag ID")
    ),
    request_body = ResolveFlagRequest,
    responses(
        (status = 200, description = "Flag resolved"),
        (status = 403, description = "Not a staff account"),
        (status = 404, description = "Flag not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "moderation"
)]
pub async fn resolve_flag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveFlagRequest>,
) -> Result<ApiResponse<Flag>, ApiError> {
    let staff = state.ledger.get_account(request.staff_id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", request.staff_id)))?;

    let flag = state.listings.resolve_flag(&staff, id, request.uphold).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(flag))
}
