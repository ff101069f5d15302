//! Offer models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::points::{PricePerUnit, Quantity};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Offer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum OfferStatus {
    /// Waiting for the listing owner to act
    Pending,
    /// Accepted and converted into an order
    Accepted,
    /// Declined by the listing owner
    Declined,
    /// Withdrawn by the offeror
    Withdrawn,
}

/// Offer model
///
/// A seller-initiated proposal against a buy listing. No points are held
/// until the listing owner accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Offer {
    /// Unique offer ID
    pub id: Uuid,
    /// Listing the offer responds to
    pub listing_id: Uuid,
    /// Account making the offer (the would-be seller)
    pub offeror_id: Uuid,
    /// Offered quantity
    pub quantity: Quantity,
    /// Offered price in points per unit
    pub price_per_unit: PricePerUnit,
    /// Optional message to the listing owner
    pub message: Option<String>,
    /// Current status
    pub status: OfferStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Create a new pending offer
    pub fn new(
        listing_id: Uuid,
        offeror_id: Uuid,
        quantity: Quantity,
        price_per_unit: PricePerUnit,
        message: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            listing_id,
            offeror_id,
            quantity,
            price_per_unit,
            message,
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the offer can still be accepted or declined
    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }
}
