//! Order API handlers
//!
//! Handlers for order management endpoints including:
//! - Place new orders
//! - Modify open orders (delta-charged)
//! - Cancel and complete orders
//! - List orders by account

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use common::model::order::Order;
use pricing_engine::OrderDraft;
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;
use crate::api::response::{ApiResponse, ApiListResponse};

/// Place order request
///
/// Mirrors the order form: quantity arrives exactly as typed and is
/// validated server-side through the same pricing rules the form ran.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    /// Paying account ID
    pub buyer_id: Uuid,
    /// Listing being ordered from
    pub listing_id: Uuid,
    /// Quantity exactly as entered
    pub quantity: String,
    /// Delivery address
    pub delivery_address: String,
    /// Agreed delivery date
    pub delivery_date: Option<NaiveDate>,
    /// Free-text delivery instructions
    pub instructions: Option<String>,
}

/// Place a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order placed successfully"),
        (status = 400, description = "Invalid draft, quantity over cap, or insufficient balance"),
        (status = 403, description = "Cannot order from your own listing"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    let draft = OrderDraft {
        quantity: request.quantity,
        delivery_address: request.delivery_address,
        delivery_date: request.delivery_date,
        additional_dates: Vec::new(),
        instructions: request.instructions,
    };

    let order = state.orders.place_order(request.buyer_id, request.listing_id, &draft).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(order))
}

/// Get an order by ID
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order retrieved successfully"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Order>, ApiError> {
    let order = state.orders.get_order(id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {}", id)))?;

    Ok(ApiResponse::new(order))
}

/// Modify order request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ModifyOrderRequest {
    /// Acting account ID (must be the buyer)
    pub buyer_id: Uuid,
    /// Quantity exactly as entered
    pub quantity: String,
    /// Delivery address
    pub delivery_address: String,
    /// Agreed delivery date
    pub delivery_date: Option<NaiveDate>,
    /// Free-text delivery instructions
    pub instructions: Option<String>,
}

/// Modify an open order
///
/// Only the escrow delta is charged or refunded, never the full new total.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/modify",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = ModifyOrderRequest,
    responses(
        (status = 200, description = "Order modified successfully"),
        (status = 400, description = "Invalid draft, no changes, or insufficient balance"),
        (status = 403, description = "Only the buyer can modify"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn modify_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ModifyOrderRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    let draft = OrderDraft {
        quantity: request.quantity,
        delivery_address: request.delivery_address,
        delivery_date: request.delivery_date,
        additional_dates: Vec::new(),
        instructions: request.instructions,
    };

    let order = state.orders.modify_order(request.buyer_id, id, &draft).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(order))
}

/// Order action request
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderActionRequest {
    /// Acting account ID
    pub actor_id: Uuid,
}

/// Confirm a pending order (seller only)
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/confirm",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Order confirmed"),
        (status = 403, description = "Only the seller can confirm"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderActionRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    let order = state.orders.confirm_order(request.actor_id, id).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(order))
}

/// Cancel an open order, releasing escrow to the buyer
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 403, description = "Only the buyer or seller can cancel"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderActionRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    tracing::info!("Attempting to cancel order: {}", id);

    let order = state.orders.cancel_order(request.actor_id, id).await
        .map_err(ApiError::Common)?;

    tracing::info!("Successfully cancelled order: {}", id);
    Ok(ApiResponse::new(order))
}

/// Complete an open order, settling escrow to the seller (buyer only)
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Order completed"),
        (status = 403, description = "Only the buyer can complete"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn complete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OrderActionRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    let order = state.orders.complete_order(request.actor_id, id).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(order))
}

/// Get orders for an account
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiListResponse<Order>, ApiError> {
    // Verify the account exists
    let _ = state.ledger.get_account(id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", id)))?;

    let orders = state.orders.orders_for_account(id).await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(orders))
}
