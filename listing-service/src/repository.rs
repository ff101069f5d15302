//! Repository for listing, flag, and comment data

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::listing::{Listing, ListingKind, ListingStatus};
use common::model::moderation::{Comment, Flag, FlagStatus};
use common::points::{PricePerUnit, Quantity};
use dashmap::DashMap;
use sqlx::{PgPool, postgres::PgPoolOptions, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Listing repository trait defining the interface for marketplace content
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Create a new listing
    async fn create_listing(&self, listing: Listing) -> Result<Listing>;

    /// Get a listing by ID
    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>>;

    /// Update a listing
    async fn update_listing(&self, listing: Listing) -> Result<Listing>;

    /// Get all active listings, newest first
    async fn active_listings(&self) -> Result<Vec<Listing>>;

    /// Create a new flag
    async fn create_flag(&self, flag: Flag) -> Result<Flag>;

    /// Get a flag by ID
    async fn get_flag(&self, id: Uuid) -> Result<Option<Flag>>;

    /// Update a flag
    async fn update_flag(&self, flag: Flag) -> Result<Flag>;

    /// Get all open flags, oldest first
    async fn open_flags(&self) -> Result<Vec<Flag>>;

    /// Create a new comment
    async fn create_comment(&self, comment: Comment) -> Result<Comment>;

    /// Get comments for a listing, oldest first
    async fn comments_for_listing(&self, listing_id: Uuid) -> Result<Vec<Comment>>;
}

/// In-memory repository for listing data
pub struct InMemoryListingRepository {
    /// Listings by ID
    pub listings: DashMap<Uuid, Listing>,
    /// Flags by ID
    pub flags: DashMap<Uuid, Flag>,
    /// Comments by ID
    pub comments: DashMap<Uuid, Comment>,
}

impl InMemoryListingRepository {
    /// Create a new in-memory listing repository
    pub fn new() -> Self {
        Self {
            listings: DashMap::new(),
            flags: DashMap::new(),
            comments: DashMap::new(),
        }
    }
}

impl Default for InMemoryListingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn create_listing(&self, listing: Listing) -> Result<Listing> {
        self.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok(self.listings.get(&id).map(|l| l.clone()))
    }

    async fn update_listing(&self, listing: Listing) -> Result<Listing> {
        self.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn active_listings(&self) -> Result<Vec<Listing>> {
        let mut listings: Vec<Listing> = self.listings
            .iter()
            .filter(|entry| entry.value().is_active())
            .map(|entry| entry.value().clone())
            .collect();

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn create_flag(&self, flag: Flag) -> Result<Flag> {
        self.flags.insert(flag.id, flag.clone());
        Ok(flag)
    }

    async fn get_flag(&self, id: Uuid) -> Result<Option<Flag>> {
        Ok(self.flags.get(&id).map(|f| f.clone()))
    }

    async fn update_flag(&self, flag: Flag) -> Result<Flag> {
        self.flags.insert(flag.id, flag.clone());
        Ok(flag)
    }

    async fn open_flags(&self) -> Result<Vec<Flag>> {
        let mut flags: Vec<Flag> = self.flags
            .iter()
            .filter(|entry| entry.value().status == FlagStatus::Open)
            .map(|entry| entry.value().clone())
            .collect();

        flags.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(flags)
    }

    async fn create_comment(&self, comment: Comment) -> Result<Comment> {
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comments_for_listing(&self, listing_id: Uuid) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self.comments
            .iter()
            .filter(|entry| entry.value().listing_id == listing_id)
            .map(|entry| entry.value().clone())
            .collect();

        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

/// PostgreSQL repository for listing data
pub struct PostgresListingRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresListingRepository {
    /// Create a new PostgreSQL listing repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let database_url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Create a repository over an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn kind_to_str(kind: ListingKind) -> &'static str {
        match kind {
            ListingKind::Sell => "sell",
            ListingKind::Buy => "buy",
            ListingKind::Service => "service",
        }
    }

    fn kind_from_str(value: &str) -> Result<ListingKind> {
        match value {
            "sell" => Ok(ListingKind::Sell),
            "buy" => Ok(ListingKind::Buy),
            "service" => Ok(ListingKind::Service),
            other => Err(Error::Internal(format!("Unknown listing kind: {}", other))),
        }
    }

    fn status_to_str(status: ListingStatus) -> &'static str {
        match status {
            ListingStatus::Active => "active",
            ListingStatus::Paused => "paused",
            ListingStatus::Completed => "completed",
            ListingStatus::Removed => "removed",
        }
    }

    fn status_from_str(value: &str) -> Result<ListingStatus> {
        match value {
            "active" => Ok(ListingStatus::Active),
            "paused" => Ok(ListingStatus::Paused),
            "completed" => Ok(ListingStatus::Completed),
            "removed" => Ok(ListingStatus::Removed),
            other => Err(Error::Internal(format!("Unknown listing status: {}", other))),
        }
    }

    fn flag_status_to_str(status: FlagStatus) -> &'static str {
        match status {
            FlagStatus::Open => "open",
            FlagStatus::Dismissed => "dismissed",
            FlagStatus::Upheld => "upheld",
        }
    }

    fn flag_status_from_str(value: &str) -> Result<FlagStatus> {
        match value {
            "open" => Ok(FlagStatus::Open),
            "dismissed" => Ok(FlagStatus::Dismissed),
            "upheld" => Ok(FlagStatus::Upheld),
            other => Err(Error::Internal(format!("Unknown flag status: {}", other))),
        }
    }

    fn listing_from_row(row: &sqlx::postgres::PgRow) -> Result<Listing> {
        let kind: String = row.get("kind");
        let status: String = row.get("status");
        let price_str: String = row.get("price_per_unit");
        let quantity_str: Option<String> = row.get("quantity_available");

        let price_per_unit = price_str.parse::<PricePerUnit>()
            .map_err(|e| Error::Internal(format!("Invalid price format: {}", e)))?;
        let quantity_available = match quantity_str {
            Some(s) => Some(s.parse::<Quantity>()
                .map_err(|e| Error::Internal(format!("Invalid quantity format: {}", e)))?),
            None => None,
        };

        Ok(Listing {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            kind: Self::kind_from_str(&kind)?,
            title: row.get("title"),
            description: row.get("description"),
            category: row.get("category"),
            price_per_unit,
            unit: row.get("unit"),
            quantity_available,
            status: Self::status_from_str(&status)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn flag_from_row(row: &sqlx::postgres::PgRow) -> Result<Flag> {
        let status: String = row.get("status");

        Ok(Flag {
            id: row.get("id"),
            listing_id: row.get("listing_id"),
            reporter_id: row.get("reporter_id"),
            reason: row.get("reason"),
            status: Self::flag_status_from_str(&status)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    async fn create_listing(&self, listing: Listing) -> Result<Listing> {
        debug!("Creating listing in database: {}", listing.id);

        sqlx::query(
            "INSERT INTO listings
                (id, owner_id, kind, title, description, category, price_per_unit,
                 unit, quantity_available, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        )
        .bind(listing.id)
        .bind(listing.owner_id)
        .bind(Self::kind_to_str(listing.kind))
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.category)
        .bind(listing.price_per_unit.to_string())
        .bind(&listing.unit)
        .bind(listing.quantity_available.map(|q| q.to_string()))
        .bind(Self::status_to_str(listing.status))
        .execute(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
        debug!("Getting listing from database: {}", id);

        let row = sqlx::query(
            "SELECT id, owner_id, kind, title, description, category, price_per_unit,
                    unit, quantity_available, status, created_at, updated_at
             FROM listings WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::listing_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_listing(&self, listing: Listing) -> Result<Listing> {
        debug!("Updating listing in database: {}", listing.id);

        let result = sqlx::query(
            "UPDATE listings
             SET title = $2, description = $3, category = $4, price_per_unit = $5,
                 unit = $6, quantity_available = $7, status = $8, updated_at = now()
             WHERE id = $1"
        )
        .bind(listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.category)
        .bind(listing.price_per_unit.to_string())
        .bind(&listing.unit)
        .bind(listing.quantity_available.map(|q| q.to_string()))
        .bind(Self::status_to_str(listing.status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ListingNotFound(format!("Listing not found: {}", listing.id)));
        }

        Ok(listing)
    }

    async fn active_listings(&self) -> Result<Vec<Listing>> {
        debug!("Getting active listings from database");

        let rows = sqlx::query(
            "SELECT id, owner_id, kind, title, description, category, price_per_unit,
                    unit, quantity_available, status, created_at, updated_at
             FROM listings
             WHERE status = 'active'
             ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            listings.push(Self::listing_from_row(&row)?);
        }

        Ok(listings)
    }

    async fn create_flag(&self, flag: Flag) -> Result<Flag> {
        debug!("Creating flag in database: {}", flag.id);

        sqlx::query(
            "INSERT INTO flags (id, listing_id, reporter_id, reason, status)
             VALUES ($1, $2, $3, $4, $5)"
        )
        .bind(flag.id)
        .bind(flag.listing_id)
        .bind(flag.reporter_id)
        .bind(&flag.reason)
        .bind(Self::flag_status_to_str(flag.status))
        .execute(&self.pool)
        .await?;

        Ok(flag)
    }

    async fn get_flag(&self, id: Uuid) -> Result<Option<Flag>> {
        let row = sqlx::query(
            "SELECT id, listing_id, reporter_id, reason, status, created_at, updated_at
             FROM flags WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::flag_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_flag(&self, flag: Flag) -> Result<Flag> {
        let result = sqlx::query(
            "UPDATE flags SET status = $2, updated_at = now() WHERE id = $1"
        )
        .bind(flag.id)
        .bind(Self::flag_status_to_str(flag.status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!("Flag not found: {}", flag.id)));
        }

        Ok(flag)
    }

    async fn open_flags(&self) -> Result<Vec<Flag>> {
        let rows = sqlx::query(
            "SELECT id, listing_id, reporter_id, reason, status, created_at, updated_at
             FROM flags
             WHERE status = 'open'
             ORDER BY created_at ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        let mut flags = Vec::with_capacity(rows.len());
        for row in rows {
            flags.push(Self::flag_from_row(&row)?);
        }

        Ok(flags)
    }

    async fn create_comment(&self, comment: Comment) -> Result<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, listing_id, author_id, body)
             VALUES ($1, $2, $3, $4)"
        )
        .bind(comment.id)
        .bind(comment.listing_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn comments_for_listing(&self, listing_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, listing_id, author_id, body, created_at
             FROM comments
             WHERE listing_id = $1
             ORDER BY created_at ASC"
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = rows.into_iter()
            .map(|row| Comment {
                id: row.get("id"),
                listing_id: row.get("listing_id"),
                author_id: row.get("author_id"),
                body: row.get("body"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(comments)
    }
}
