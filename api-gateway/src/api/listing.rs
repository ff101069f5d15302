//! Listing API handlers
//!
//! Handlers for the marketplace feed and listing content:
//! - Post new listings
//! - Browse the filtered feed
//! - Flag listings for moderation
//! - Comment on listings

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use common::model::listing::{Listing, ListingKind};
use common::model::moderation::{Comment, Flag};
use common::points::{Points, PricePerUnit, Quantity};
use listing_service::FeedFilter;
use serde::Deserialize;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;
use crate::api::response::{ApiResponse, ApiListResponse, PaginatedResponse};

/// Create listing request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    /// Owning account ID
    pub owner_id: Uuid,
    /// Listing kind
    pub kind: ListingKind,
    /// Title shown in the feed
    pub title: String,
    /// Full description
    pub description: String,
    /// Category
    pub category: String,
    /// Price in points per unit
    pub price_per_unit: PricePerUnit,
    /// Unit the quantity is denominated in
    pub unit: String,
    /// Available quantity; omit for uncapped listings
    pub quantity_available: Option<Quantity>,
}

/// Post a new listing
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 200, description = "Listing created successfully"),
        (status = 400, description = "Invalid listing request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateListingRequest>,
) -> Result<ApiResponse<Listing>, ApiError> {
    // Verify the owner exists
    let _ = state.ledger.get_account(request.owner_id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", request.owner_id)))?;

    let listing = state.listings.create_listing(
        request.owner_id,
        request.kind,
        &request.title,
        &request.description,
        &request.category,
        request.price_per_unit,
        &request.unit,
        request.quantity_available,
    ).await.map_err(ApiError::Common)?;

    Ok(ApiResponse::new(listing))
}

/// Get a listing by ID
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing retrieved successfully"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Listing>, ApiError> {
    let listing = state.listings.get_listing(id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Listing not found: {}", id)))?;

    Ok(ApiResponse::new(listing))
}

/// Feed query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedQuery {
    /// Restrict to one listing kind
    pub kind: Option<ListingKind>,
    /// Exact category match
    pub category: Option<String>,
    /// Free-text search over title and description
    pub q: Option<String>,
    /// Maximum price per unit
    pub max_price: Option<Points>,
    /// Page number (1-based)
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

/// Browse the filtered feed
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    params(
        ("kind" = Option<ListingKind>, Query, description = "Filter by listing kind"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("q" = Option<String>, Query, description = "Free-text search"),
        ("max_price" = Option<String>, Query, description = "Maximum price per unit"),
        ("page" = Option<usize>, Query, description = "Page number"),
        ("per_page" = Option<usize>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Feed retrieved successfully"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<PaginatedResponse<Listing>, ApiError> {
    let filter = FeedFilter {
        kind: query.kind,
        category: query.category,
        query: query.q,
        max_price: query.max_price,
    };

    let listings = state.listings.feed(&filter).await
        .map_err(ApiError::Common)?;

    // Paginate over the filtered snapshot
    let total = listings.len();
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);
    let start = (page - 1).saturating_mul(per_page);
    let items = listings.into_iter().skip(start).take(per_page).collect();

    Ok(PaginatedResponse::new(items, page, per_page, total))
}

/// Flag request
#[derive(Debug, Deserialize, ToSchema)]
pub struct FlagListingRequest {
    /// Reporting account ID
    pub reporter_id: Uuid,
    /// Why the listing is being reported
    pub reason: String,
}

/// Flag a listing for staff review
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/flag",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = FlagListingRequest,
    responses(
        (status = 200, description = "Listing flagged successfully"),
        (status = 404, description = "Listing not found"),
        (status = 400, description = "Invalid flag request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn flag_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<FlagListingRequest>,
) -> Result<ApiResponse<Flag>, ApiError> {
    let flag = state.listings.flag_listing(request.reporter_id, id, &request.reason).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(flag))
}

/// Comment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    /// Commenting account ID
    pub author_id: Uuid,
    /// Comment text
    pub body: String,
}

/// Comment on a listing
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = AddCommentRequest,
    responses(
        (status = 200, description = "Comment added successfully"),
        (status = 404, description = "Listing not found"),
        (status = 400, description = "Invalid comment"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddCommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment = state.listings.add_comment(request.author_id, id, &request.body).await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(comment))
}

/// Get comments for a listing
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully"),
        (status = 404, description = "Listing not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "listing"
)]
pub async fn get_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<ApiListResponse<Comment>, ApiError> {
    // Verify the listing exists before fetching comments
    let _ = state.listings.get_listing(id).await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Listing not found: {}", id)))?;

    let comments = state.listings.comments_for_listing(id).await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new(comments))
}
