//! Listing service implementation

use std::sync::Arc;

use chrono::Duration;
use common::error::{Error, Result};
use common::model::account::Account;
use common::model::listing::{Listing, ListingKind, ListingStatus};
use common::model::moderation::{Comment, Flag, FlagStatus};
use common::points::{PricePerUnit, Quantity};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{FeedFilter, FeedSnapshot};
use crate::repository::{InMemoryListingRepository, ListingRepository};

/// How long a feed snapshot is served before a refresh
const DEFAULT_FEED_TTL_SECS: i64 = 30;

/// Listing service for the marketplace feed and moderation
pub struct ListingService {
    /// Repository for listing data
    repo: Arc<dyn ListingRepository>,
    /// Cached feed snapshot, refreshed when stale
    feed_cache: RwLock<Option<FeedSnapshot>>,
    /// Staleness window for the cached feed
    feed_ttl: Duration,
}

impl ListingService {
    /// Create a new listing service with an in-memory repository
    pub fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryListingRepository::new()))
    }

    /// Create a new listing service over the given repository
    pub fn with_repository(repo: Arc<dyn ListingRepository>) -> Self {
        Self {
            repo,
            feed_cache: RwLock::new(None),
            feed_ttl: Duration::seconds(DEFAULT_FEED_TTL_SECS),
        }
    }

    /// Override the feed staleness window
    pub fn with_feed_ttl(mut self, ttl: Duration) -> Self {
        self.feed_ttl = ttl;
        self
    }

    /// Create a new listing
    pub async fn create_listing(
        &self,
        owner_id: Uuid,
        kind: ListingKind,
        title: &str,
        description: &str,
        category: &str,
        price_per_unit: PricePerUnit,
        unit: &str,
        quantity_available: Option<Quantity>,
    ) -> Result<Listing> {
        info!("Creating {:?} listing '{}' for {}", kind, title, owner_id);

        let title = title.trim();
        if title.is_empty() {
            return Err(Error::ValidationError("Listing title must not be empty".to_string()));
        }
        if price_per_unit < Decimal::ZERO {
            return Err(Error::ValidationError(format!(
                "Price per unit must not be negative, got {}", price_per_unit
            )));
        }
        if let Some(quantity) = quantity_available {
            if quantity <= Decimal::ZERO {
                return Err(Error::ValidationError(format!(
                    "Available quantity must be positive, got {}", quantity
                )));
            }
        }

        let listing = Listing::new(
            owner_id,
            kind,
            title.to_string(),
            description.to_string(),
            category.to_string(),
            price_per_unit,
            unit.to_string(),
            quantity_available,
        );

        let listing = self.repo.create_listing(listing).await?;
        self.invalidate_feed().await;
        Ok(listing)
    }

    /// Get a listing by ID
    pub async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        self.repo.get_listing(id).await
    }

    /// Change a listing's status
    pub async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<Listing> {
        let mut listing = self.repo.get_listing(id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", id)))?;

        listing.status = status;
        listing.updated_at = chrono::Utc::now();

        let listing = self.repo.update_listing(listing).await?;
        self.invalidate_feed().await;
        Ok(listing)
    }

    /// Consume available quantity when an order is placed
    pub async fn consume_quantity(&self, id: Uuid, quantity: Quantity) -> Result<Listing> {
        let mut listing = self.repo.get_listing(id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", id)))?;

        listing.consume(quantity).map_err(Error::ExceedsAvailable)?;

        // A sold-out listing leaves the feed
        if listing.quantity_available == Some(Decimal::ZERO) {
            listing.status = ListingStatus::Completed;
        }

        let listing = self.repo.update_listing(listing).await?;
        self.invalidate_feed().await;
        Ok(listing)
    }

    /// Restore quantity when an order is cancelled or reduced
    pub async fn restore_quantity(&self, id: Uuid, quantity: Quantity) -> Result<Listing> {
        let mut listing = self.repo.get_listing(id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", id)))?;

        listing.restore(quantity);

        // Restocking re-opens a sold-out listing
        if listing.status == ListingStatus::Completed {
            listing.status = ListingStatus::Active;
        }

        let listing = self.repo.update_listing(listing).await?;
        self.invalidate_feed().await;
        Ok(listing)
    }

    /// Get the filtered feed, serving the cached snapshot while fresh
    pub async fn feed(&self, filter: &FeedFilter) -> Result<Vec<Listing>> {
        {
            let cache = self.feed_cache.read().await;
            if let Some(snapshot) = cache.as_ref() {
                if snapshot.is_fresh(self.feed_ttl) {
                    debug!("Serving feed from cached snapshot");
                    return Ok(Self::apply_filter(&snapshot.listings, filter));
                }
            }
        }

        // Stale or empty cache: refresh from the repository
        debug!("Refreshing feed snapshot");
        let listings = self.repo.active_listings().await?;
        let snapshot = FeedSnapshot::new(listings);
        let filtered = Self::apply_filter(&snapshot.listings, filter);

        let mut cache = self.feed_cache.write().await;
        *cache = Some(snapshot);

        Ok(filtered)
    }

    /// Drop the cached snapshot so the next feed call refreshes
    pub async fn invalidate_feed(&self) {
        let mut cache = self.feed_cache.write().await;
        *cache = None;
    }

    fn apply_filter(listings: &[Listing], filter: &FeedFilter) -> Vec<Listing> {
        listings.iter()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect()
    }

    /// Flag a listing for staff review
    pub async fn flag_listing(&self, reporter_id: Uuid, listing_id: Uuid, reason: &str) -> Result<Flag> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::ValidationError("Flag reason must not be empty".to_string()));
        }

        let _listing = self.repo.get_listing(listing_id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", listing_id)))?;

        info!("Listing {} flagged by {}", listing_id, reporter_id);
        self.repo.create_flag(Flag::new(listing_id, reporter_id, reason.to_string())).await
    }

    /// Get all open flags for the moderation queue
    pub async fn open_flags(&self) -> Result<Vec<Flag>> {
        self.repo.open_flags().await
    }

    /// Resolve a flag; staff only. Upholding removes the listing.
    pub async fn resolve_flag(&self, staff: &Account, flag_id: Uuid, uphold: bool) -> Result<Flag> {
        if !staff.staff {
            return Err(Error::AuthorizationError(format!(
                "Account {} is not staff", staff.id
            )));
        }

        let mut flag = self.repo.get_flag(flag_id).await?
            .ok_or_else(|| Error::ValidationError(format!("Flag not found: {}", flag_id)))?;

        if flag.status != FlagStatus::Open {
            return Err(Error::ValidationError(format!("Flag {} is already resolved", flag_id)));
        }

        flag.status = if uphold { FlagStatus::Upheld } else { FlagStatus::Dismissed };
        flag.updated_at = chrono::Utc::now();
        let flag = self.repo.update_flag(flag).await?;

        if uphold {
            info!("Flag {} upheld, removing listing {}", flag_id, flag.listing_id);
            self.set_status(flag.listing_id, ListingStatus::Removed).await?;
        }

        Ok(flag)
    }

    /// Add a comment to a listing
    pub async fn add_comment(&self, author_id: Uuid, listing_id: Uuid, body: &str) -> Result<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::ValidationError("Comment body must not be empty".to_string()));
        }

        let _listing = self.repo.get_listing(listing_id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", listing_id)))?;

        self.repo.create_comment(Comment::new(listing_id, author_id, body.to_string())).await
    }

    /// Get comments for a listing
    pub async fn comments_for_listing(&self, listing_id: Uuid) -> Result<Vec<Comment>> {
        self.repo.comments_for_listing(listing_id).await
    }
}

impl Default for ListingService {
    fn default() -> Self {
        Self::new()
    }
}
