//! Account and points balance models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::points::Points;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Account model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Name shown on listings and comments
    pub display_name: String,
    /// Whether this account can resolve moderation flags
    pub staff: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new member account
    pub fn new(display_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            display_name,
            staff: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Points balance model
///
/// Points are the only asset on the platform, so each account carries
/// exactly one balance row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct PointsBalance {
    /// Account ID
    pub account_id: Uuid,
    /// Total points
    pub total: Points,
    /// Points available for new orders (not held in escrow)
    pub available: Points,
    /// Points held in escrow for pending orders
    pub held: Points,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl PointsBalance {
    /// Create a new balance with zero points
    pub fn new(account_id: Uuid) -> Self {
        Self {
            account_id,
            total: Points::ZERO,
            available: Points::ZERO,
            held: Points::ZERO,
            updated_at: Utc::now(),
        }
    }

    /// Grant purchased or seeded points
    pub fn grant(&mut self, amount: Points) {
        self.total += amount;
        self.available += amount;
        self.updated_at = Utc::now();
    }

    /// Hold points in escrow for an order
    pub fn hold(&mut self, amount: Points) -> Result<(), String> {
        if amount > self.available {
            return Err(format!("Insufficient points: {} available", self.available));
        }

        self.available -= amount;
        self.held += amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Release held points (on order cancel or downward modification)
    pub fn release(&mut self, amount: Points) {
        self.held -= amount;
        self.available += amount;
        self.updated_at = Utc::now();
    }

    /// Remove held points permanently (buyer side of a settlement)
    pub fn debit_held(&mut self, amount: Points) -> Result<(), String> {
        if amount > self.held {
            return Err(format!("Insufficient held points: {} held", self.held));
        }

        self.held -= amount;
        self.total -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Add settled points (seller side of a settlement)
    pub fn credit(&mut self, amount: Points) {
        self.total += amount;
        self.available += amount;
        self.updated_at = Utc::now();
    }
}
