//! Feed models and filter predicates

use chrono::{DateTime, Utc};
use common::model::listing::{Listing, ListingKind};
use common::points::Points;
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// Filter applied to the cached feed
///
/// All criteria are optional and combine with AND. The predicate is pure
/// so it can run over the in-memory snapshot on every change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct FeedFilter {
    /// Restrict to one listing kind
    pub kind: Option<ListingKind>,
    /// Exact category match, case-insensitive
    pub category: Option<String>,
    /// Free-text search over title and description, case-insensitive
    pub query: Option<String>,
    /// Maximum price per unit in points
    pub max_price: Option<Points>,
}

impl FeedFilter {
    /// Check a listing against every set criterion
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(kind) = self.kind {
            if listing.kind != kind {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if !listing.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        if let Some(query) = &self.query {
            let query = query.to_lowercase();
            let in_title = listing.title.to_lowercase().contains(&query);
            let in_description = listing.description.to_lowercase().contains(&query);
            if !in_title && !in_description {
                return false;
            }
        }

        if let Some(max_price) = self.max_price {
            if listing.price_per_unit > max_price {
                return false;
            }
        }

        true
    }
}

/// A point-in-time copy of the active listings
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    /// Active listings, newest first
    pub listings: Vec<Listing>,
    /// When the snapshot was taken
    pub refreshed_at: DateTime<Utc>,
}

impl FeedSnapshot {
    /// Snapshot the given listings now
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            refreshed_at: Utc::now(),
        }
    }

    /// Check whether the snapshot is still within the staleness window
    pub fn is_fresh(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.refreshed_at < ttl
    }
}
