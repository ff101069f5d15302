//! Listing models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::points::{PricePerUnit, Quantity};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Kind of listing a member posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum ListingKind {
    /// Member is selling goods
    Sell,
    /// Member wants to buy goods (sellers respond with offers)
    Buy,
    /// Member offers a service (uncapped quantity)
    Service,
}

/// Listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum ListingStatus {
    /// Visible in the feed and accepting orders/offers
    Active,
    /// Hidden by the owner, can be re-activated
    Paused,
    /// All quantity sold or the owner closed it
    Completed,
    /// Removed by moderation
    Removed,
}

/// Listing model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Listing {
    /// Unique listing ID
    pub id: Uuid,
    /// Owning account ID
    pub owner_id: Uuid,
    /// Listing kind
    pub kind: ListingKind,
    /// Short title shown in the feed
    pub title: String,
    /// Full description
    pub description: String,
    /// Category (e.g. "produce", "tools", "services")
    pub category: String,
    /// Price in points per unit
    pub price_per_unit: PricePerUnit,
    /// Unit the quantity is denominated in (e.g. "kg", "hour", "item")
    pub unit: String,
    /// Remaining quantity; None means uncapped
    pub quantity_available: Option<Quantity>,
    /// Current status
    pub status: ListingStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new active listing
    pub fn new(
        owner_id: Uuid,
        kind: ListingKind,
        title: String,
        description: String,
        category: String,
        price_per_unit: PricePerUnit,
        unit: String,
        quantity_available: Option<Quantity>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            kind,
            title,
            description,
            category,
            price_per_unit,
            unit,
            quantity_available,
            status: ListingStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the listing can accept orders or offers
    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// Consume available quantity when an order is placed
    pub fn consume(&mut self, quantity: Quantity) -> Result<(), String> {
        if let Some(available) = self.quantity_available {
            if quantity > available {
                return Err(format!("Only {} {} available", available, self.unit));
            }
            self.quantity_available = Some(available - quantity);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Restore quantity when an order is cancelled or reduced
    pub fn restore(&mut self, quantity: Quantity) {
        if let Some(available) = self.quantity_available {
            self.quantity_available = Some(available + quantity);
        }
        self.updated_at = Utc::now();
    }
}
