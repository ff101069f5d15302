//! Repository for order and offer data

use async_trait::async_trait;
use chrono::NaiveDate;
use common::error::{Error, Result};
use common::model::offer::{Offer, OfferStatus};
use common::model::order::{Order, OrderStatus};
use common::points::{Points, PricePerUnit, Quantity};
use dashmap::DashMap;
use sqlx::{PgPool, postgres::PgPoolOptions, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Order repository trait defining the interface for order/offer storage
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Create a new order
    async fn create_order(&self, order: Order) -> Result<Order>;

    /// Get an order by ID
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;

    /// Update an order (last write wins)
    async fn update_order(&self, order: Order) -> Result<Order>;

    /// Get all orders where the account is buyer or seller, newest first
    async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>>;

    /// Create a new offer
    async fn create_offer(&self, offer: Offer) -> Result<Offer>;

    /// Get an offer by ID
    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>>;

    /// Update an offer
    async fn update_offer(&self, offer: Offer) -> Result<Offer>;

    /// Get all offers against a listing, newest first
    async fn offers_for_listing(&self, listing_id: Uuid) -> Result<Vec<Offer>>;
}

/// In-memory repository for order data
pub struct InMemoryOrderRepository {
    /// Orders by ID
    pub orders: DashMap<Uuid, Order>,
    /// Offers by ID
    pub offers: DashMap<Uuid, Offer>,
}

impl InMemoryOrderRepository {
    /// Create a new in-memory order repository
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            offers: DashMap::new(),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: Order) -> Result<Order> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn update_order(&self, order: Order) -> Result<Order> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                order.buyer_id == account_id || order.seller_id == account_id
            })
            .map(|entry| entry.value().clone())
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn create_offer(&self, offer: Offer) -> Result<Offer> {
        self.offers.insert(offer.id, offer.clone());
        Ok(offer)
    }

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        Ok(self.offers.get(&id).map(|o| o.clone()))
    }

    async fn update_offer(&self, offer: Offer) -> Result<Offer> {
        self.offers.insert(offer.id, offer.clone());
        Ok(offer)
    }

    async fn offers_for_listing(&self, listing_id: Uuid) -> Result<Vec<Offer>> {
        let mut offers: Vec<Offer> = self.offers
            .iter()
            .filter(|entry| entry.value().listing_id == listing_id)
            .map(|entry| entry.value().clone())
            .collect();

        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }
}

/// PostgreSQL repository for order data
pub struct PostgresOrderRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Create a new PostgreSQL order repository
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

    fn order_status_to_str(status: OrderStatus) -> &'static str {
        match status {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    fn order_status_from_str(value: &str) -> Result<OrderStatus> {
        match value {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(Error::Internal(format!("Unknown order status: {}", other))),
        }
    }

    fn offer_status_to_str(status: OfferStatus) -> &'static str {
        match status {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
            OfferStatus::Withdrawn => "withdrawn",
        }
    }

    fn offer_status_from_str(value: &str) -> Result<OfferStatus> {
        match value {
            "pending" => Ok(OfferStatus::Pending),
            "accepted" => Ok(OfferStatus::Accepted),
            "declined" => Ok(OfferStatus::Declined),
            "withdrawn" => Ok(OfferStatus::Withdrawn),
            other => Err(Error::Internal(format!("Unknown offer status: {}", other))),
        }
    }

    fn order_from_row(row: &sqlx::postgres::PgRow) -> Result<Order> {
        let quantity_str: String = row.get("quantity");
        let price_str: String = row.get("price_per_unit");
        let total_str: String = row.get("total_price");
        let status: String = row.get("status");
        let additional_dates: serde_json::Value = row.get("additional_dates");

        let quantity = quantity_str.parse::<Quantity>()
            .map_err(|e| Error::Internal(format!("Invalid quantity format: {}", e)))?;
        let price_per_unit = price_str.parse::<PricePerUnit>()
            .map_err(|e| Error::Internal(format!("Invalid price format: {}", e)))?;
        let total_price = total_str.parse::<Points>()
            .map_err(|e| Error::Internal(format!("Invalid total format: {}", e)))?;
        let additional_dates: Vec<NaiveDate> = serde_json::from_value(additional_dates)?;

        Ok(Order {
            id: row.get("id"),
            listing_id: row.get("listing_id"),
            offer_id: row.get("offer_id"),
            buyer_id: row.get("buyer_id"),
            seller_id: row.get("seller_id"),
            quantity,
            price_per_unit,
            total_price,
            delivery_address: row.get("delivery_address"),
            delivery_date: row.get("delivery_date"),
            additional_dates,
            instructions: row.get("instructions"),
            status: Self::order_status_from_str(&status)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn offer_from_row(row: &sqlx::postgres::PgRow) -> Result<Offer> {
        let quantity_str: String = row.get("quantity");
        let price_str: String = row.get("price_per_unit");
        let status: String = row.get("status");

        let quantity = quantity_str.parse::<Quantity>()
            .map_err(|e| Error::Internal(format!("Invalid quantity format: {}", e)))?;
        let price_per_unit = price_str.parse::<PricePerUnit>()
            .map_err(|e| Error::Internal(format!("Invalid price format: {}", e)))?;

        Ok(Offer {
            id: row.get("id"),
            listing_id: row.get("listing_id"),
            offeror_id: row.get("offeror_id"),
            quantity,
            price_per_unit,
            message: row.get("message"),
            status: Self::offer_status_from_str(&status)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create_order(&self, order: Order) -> Result<Order> {
        debug!("Creating order in database: {}", order.id);

        sqlx::query(
            "INSERT INTO orders
                (id, listing_id, offer_id, buyer_id, seller_id, quantity, price_per_unit,
                 total_price, delivery_address, delivery_date, additional_dates,
                 instructions, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        )
        .bind(order.id)
        .bind(order.listing_id)
        .bind(order.offer_id)
        .bind(order.buyer_id)
        .bind(order.seller_id)
        .bind(order.quantity.to_string())
        .bind(order.price_per_unit.to_string())
        .bind(order.total_price.to_string())
        .bind(&order.delivery_address)
        .bind(order.delivery_date)
        .bind(serde_json::to_value(&order.additional_dates)?)
        .bind(&order.instructions)
        .bind(Self::order_status_to_str(order.status))
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        debug!("Getting order from database: {}", id);

        let row = sqlx::query(
            "SELECT id, listing_id, offer_id, buyer_id, seller_id, quantity, price_per_unit,
                    total_price, delivery_address, delivery_date, additional_dates,
                    instructions, status, created_at, updated_at
             FROM orders WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::order_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_order(&self, order: Order) -> Result<Order> {
        debug!("Updating order in database: {}", order.id);

        let result = sqlx::query(
            "UPDATE orders
             SET quantity = $2, total_price = $3, delivery_address = $4,
                 delivery_date = $5, instructions = $6, status = $7, updated_at = now()
             WHERE id = $1"
        )
        .bind(order.id)
        .bind(order.quantity.to_string())
        .bind(order.total_price.to_string())
        .bind(&order.delivery_address)
        .bind(order.delivery_date)
        .bind(&order.instructions)
        .bind(Self::order_status_to_str(order.status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::OrderNotFound(format!("Order not found: {}", order.id)));
        }

        Ok(order)
    }

    async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, listing_id, offer_id, buyer_id, seller_id, quantity, price_per_unit,
                    total_price, delivery_address, delivery_date, additional_dates,
                    instructions, status, created_at, updated_at
             FROM orders
             WHERE buyer_id = $1 OR seller_id = $1
             ORDER BY created_at DESC"
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(Self::order_from_row(&row)?);
        }

        Ok(orders)
    }

    async fn create_offer(&self, offer: Offer) -> Result<Offer> {
        debug!("Creating offer in database: {}", offer.id);

        sqlx::query(
            "INSERT INTO offers
                (id, listing_id, offeror_id, quantity, price_per_unit, message, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
        .bind(offer.id)
        .bind(offer.listing_id)
        .bind(offer.offeror_id)
        .bind(offer.quantity.to_string())
        .bind(offer.price_per_unit.to_string())
        .bind(&offer.message)
        .bind(Self::offer_status_to_str(offer.status))
        .execute(&self.pool)
        .await?;

        Ok(offer)
    }

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        let row = sqlx::query(
            "SELECT id, listing_id, offeror_id, quantity, price_per_unit, message,
                    status, created_at, updated_at
             FROM offers WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::offer_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_offer(&self, offer: Offer) -> Result<Offer> {
        let result = sqlx::query(
            "UPDATE offers SET status = $2, updated_at = now() WHERE id = $1"
        )
        .bind(offer.id)
        .bind(Self::offer_status_to_str(offer.status))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::OfferNotFound(format!("Offer not found: {}", offer.id)));
        }

        Ok(offer)
    }

    async fn offers_for_listing(&self, listing_id: Uuid) -> Result<Vec<Offer>> {
        let rows = sqlx::query(
            "SELECT id, listing_id, offeror_id, quantity, price_per_unit, message,
                    status, created_at, updated_at
             FROM offers
             WHERE listing_id = $1
             ORDER BY created_at DESC"
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        let mut offers = Vec::with_capacity(rows.len());
        for row in rows {
            offers.push(Self::offer_from_row(&row)?);
        }

        Ok(offers)
    }
}
