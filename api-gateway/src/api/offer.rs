//! Offer API handlers
//!
//! Handlers for the offer flow against buy listings:
//! - Make offers
//! - List offers on a listing
//! - Accept, decline, or withdraw an offer

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use common::model::offer::Offer;
use common::model::order::Order;
use common::points::{PricePerUnit, Quantity};
use pricing_engine::OrderDraft;
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;
use crate::api::response::{ApiResponse, ApiListResponse};

/// Make offer request
#[derive(Debug, Deserialize, ToSchema)]
pub struct MakeOfferRequest {
    /// Offering account ID
    pub offeror_id: Uuid,
    /// Buy listing the offer responds to
    pub listing_id: Uuid,
    /// Offered quantity
    pub quantity: Quantity,
    /// Offered price in points per unit
    pub price_per_unit: PricePerUnit,
    /// Optional message to the listing owner
    pub message: Option<String>,
}

/// Make an offer against a buy listing
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    request_body = MakeOfferRequest,
    responses(
        (status = 200, description = "Offer created successfully"),
        (status = 400, description = "Invalid offer request"),
        (status = 403, description = "Cannot offer on your own listing"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "offer"
)]
pub async fn make_offer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MakeOfferRequest>,
) -> Result<ApiResponse<Offer>, ApiError> {
    let offer = state.orders.make_offer(
        request.offeror_id,
        request.listing_id,
        request.quantity,
        request.price_per_unit,
        request.message,
    ).await.map_err(ApiError::Common)?;

    Ok(ApiResponse::new(offer))
}

/// Get offers for a listing
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/offers",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Offers retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "offer"
)]
pub async fn get_offers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiListResponse<Offer>, ApiError> {
    let offers = state.orders.offers_for_listing(id).await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(offers))
}

/// Accept offer request
///
/// Carries the acceptance form: quantity as typed, delivery details, and
/// optionally further acceptable dates.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptOfferRequest {
    /// Accepting account ID (the listing owner, who pays)
    pub acceptor_id: Uuid,
    /// Quantity exactly as entered
    pub quantity: String,
    /// Delivery address
    pub delivery_address: String,
    /// Agreed delivery date
    pub delivery_date: Option<NaiveDate>,
    /// Further acceptable delivery dates
    #[serde(default)]
    pub additional_dates: Vec<NaiveDate>,
    /// Free-text delivery instructions
    pub instructions: Option<String>,
}

/// Accept an offer, converting it into an order
#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    request_body = AcceptOfferRequest,
    responses(
        (status = 200, description = "Offer accepted, order created"),
        (status = 400, description = "Invalid acceptance draft or insufficient balance"),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Offer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "offer"
)]
pub async fn accept_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AcceptOfferRequest>,
) -> Result<ApiResponse<Order>, ApiError> {
    let draft = OrderDraft {
        quantity: request.quantity,
        delivery_address: request.delivery_address,
        delivery_date: request.delivery_date,
        additional_dates: request.additional_dates,
        instructions: request.instructions,
    };

    let order = state.orders.accept_offer(request.acceptor_id, id, &draft).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(order))
}

/// Decline/withdraw request
#[derive(Debug, Deserialize, ToSchema)]
pub struct OfferActionRequest {
    /// Acting account ID
    pub actor_id: Uuid,
}

/// Decline a pending offer (listing owner only)
#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/decline",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    request_body = OfferActionRequest,
    responses(
        (status = 200, description = "Offer declined"),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Offer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "offer"
)]
pub async fn decline_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OfferActionRequest>,
) -> Result<ApiResponse<Offer>, ApiError> {
    let offer = state.orders.decline_offer(request.actor_id, id).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(offer))
}

/// Withdraw a pending offer (offeror only)
#[utoipa::path(
    post,
    path = "/api/v1/offers/{id}/withdraw",
    params(
        ("id" = Uuid, Path, description = "Offer ID")
    ),
    request_body = OfferActionRequest,
    responses(
        (status = 200, description = "Offer withdrawn"),
        (status = 403, description = "Not the offeror"),
        (status = 404, description = "Offer not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "offer"
)]
pub async fn withdraw_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<OfferActionRequest>,
) -> Result<ApiResponse<Offer>, ApiError> {
    let offer = state.orders.withdraw_offer(request.actor_id, id).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(offer))
}
