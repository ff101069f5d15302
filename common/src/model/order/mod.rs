//! Order models and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::points::{Points, PricePerUnit, Quantity};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum OrderStatus {
    /// Order has been placed, escrow held, awaiting seller confirmation
    Pending,
    /// Seller confirmed the delivery
    Confirmed,
    /// Buyer confirmed fulfilment; escrow settled to the seller
    Completed,
    /// Order has been cancelled; escrow released to the buyer
    Cancelled,
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,
    /// Listing the order was placed against
    pub listing_id: Uuid,
    /// Offer the order was created from, if any
    pub offer_id: Option<Uuid>,
    /// Paying account
    pub buyer_id: Uuid,
    /// Fulfilling account
    pub seller_id: Uuid,
    /// Ordered quantity
    pub quantity: Quantity,
    /// Price in points per unit at order time
    pub price_per_unit: PricePerUnit,
    /// Total price in whole points, held in escrow while the order is open
    pub total_price: Points,
    /// Delivery address
    pub delivery_address: String,
    /// Agreed delivery date
    pub delivery_date: NaiveDate,
    /// Further acceptable delivery dates (offer acceptance only)
    pub additional_dates: Vec<NaiveDate>,
    /// Free-text delivery instructions
    pub instructions: Option<String>,
    /// Current status
    pub status: OrderStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Check if the order still holds escrow and can be modified or cancelled
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}
