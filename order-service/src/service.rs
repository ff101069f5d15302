//! Order service implementation

use std::sync::Arc;

use chrono::Utc;
use common::error::{Error, Result};
use common::model::listing::{Listing, ListingKind};
use common::model::offer::{Offer, OfferStatus};
use common::model::order::{Order, OrderStatus};
use common::points::{Points, PricePerUnit, Quantity};
use ledger_service::LedgerService;
use listing_service::ListingService;
use pricing_engine::{BuildRejection, DraftContext, OrderDraft, OrderIntent, OrderIntentBuilder};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::{InMemoryOrderRepository, OrderRepository};

/// Order service handling order placement, offer flows, modification,
/// cancellation, and completion
pub struct OrderService {
    /// Repository for order and offer data
    repo: Arc<dyn OrderRepository>,
    /// Points ledger (balances and escrow)
    ledger: Arc<LedgerService>,
    /// Listings and feed
    listings: Arc<ListingService>,
}

impl OrderService {
    /// Create a new order service with an in-memory repository
    pub fn new(ledger: Arc<LedgerService>, listings: Arc<ListingService>) -> Self {
        Self::with_repository(Arc::new(InMemoryOrderRepository::new()), ledger, listings)
    }

    /// Create a new order service over the given repository
    pub fn with_repository(
        repo: Arc<dyn OrderRepository>,
        ledger: Arc<LedgerService>,
        listings: Arc<ListingService>,
    ) -> Self {
        Self { repo, ledger, listings }
    }

    /// Get an order by ID
    pub async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        self.repo.get_order(id).await
    }

    /// Get all orders where the account is buyer or seller
    pub async fn orders_for_account(&self, account_id: Uuid) -> Result<Vec<Order>> {
        self.repo.orders_for_account(account_id).await
    }

    /// Get all offers against a listing
    pub async fn offers_for_listing(&self, listing_id: Uuid) -> Result<Vec<Offer>> {
        self.repo.offers_for_listing(listing_id).await
    }

    /// Place an order against a sell or service listing
    ///
    /// The draft is validated through the pricing engine, the total is
    /// held in escrow, and the listing's availability is consumed before
    /// the order is recorded.
    pub async fn place_order(&self, buyer_id: Uuid, listing_id: Uuid, draft: &OrderDraft) -> Result<Order> {
        let listing = self.require_listing(listing_id).await?;

        if !listing.is_active() {
            return Err(Error::ValidationError(format!("Listing {} is not active", listing_id)));
        }
        if listing.kind == ListingKind::Buy {
            return Err(Error::ValidationError(
                "Buy listings take offers, not orders".to_string(),
            ));
        }
        if buyer_id == listing.owner_id {
            return Err(Error::SelfDealing(
                "You cannot order from your own listing".to_string(),
            ));
        }

        let balance = self.available_points(buyer_id).await?;
        let context = Self::draft_context(
            listing.price_per_unit,
            listing.quantity_available,
            &listing.unit,
            balance,
        );

        let built = OrderIntentBuilder::new(context)
            .build(draft)
            .map_err(Self::rejection_to_error)?;

        debug!(
            "Placing order on listing {}: {} x {} = {} points",
            listing_id, built.intent.quantity, listing.price_per_unit, built.intent.total_price
        );

        // Hold escrow first; release it again if the listing races out of stock
        self.ledger.hold(buyer_id, built.intent.total_price).await?;
        if let Err(e) = self.listings.consume_quantity(listing.id, built.intent.quantity).await {
            self.ledger.release(buyer_id, built.intent.total_price).await?;
            return Err(e);
        }

        let order = Self::order_from_intent(listing.id, None, buyer_id, listing.owner_id, built.intent);
        let order = self.repo.create_order(order).await?;

        info!("Order {} placed on listing {}", order.id, listing_id);
        Ok(order)
    }

    /// Make an offer against a buy listing
    ///
    /// No points are held until the listing owner accepts.
    pub async fn make_offer(
        &self,
        offeror_id: Uuid,
        listing_id: Uuid,
        quantity: Quantity,
        price_per_unit: PricePerUnit,
        message: Option<String>,
    ) -> Result<Offer> {
        let listing = self.require_listing(listing_id).await?;

        if !listing.is_active() {
            return Err(Error::ValidationError(format!("Listing {} is not active", listing_id)));
        }
        if listing.kind != ListingKind::Buy {
            return Err(Error::ValidationError(
                "Offers can only be made against buy listings".to_string(),
            ));
        }
        if offeror_id == listing.owner_id {
            return Err(Error::SelfDealing(
                "You cannot make an offer on your own listing".to_string(),
            ));
        }
        if quantity <= Decimal::ZERO {
            return Err(Error::ValidationError(format!("Offer quantity must be positive, got {}", quantity)));
        }
        if price_per_unit < Decimal::ZERO {
            return Err(Error::ValidationError(format!(
                "Offer price must not be negative, got {}", price_per_unit
            )));
        }

        self.require_account(offeror_id).await?;

        let offer = Offer::new(listing_id, offeror_id, quantity, price_per_unit, message);
        let offer = self.repo.create_offer(offer).await?;

        info!("Offer {} made on listing {}", offer.id, listing_id);
        Ok(offer)
    }

    /// Accept an offer, converting it into an order
    ///
    /// The acceptor is the listing owner and the paying party; the draft
    /// is validated against their balance at the offer's price, capped at
    /// the offered quantity. Additional acceptable delivery dates are
    /// allowed in this flow.
    pub async fn accept_offer(&self, acceptor_id: Uuid, offer_id: Uuid, draft: &OrderDraft) -> Result<Order> {
        let mut offer = self.repo.get_offer(offer_id).await?
            .ok_or_else(|| Error::OfferNotFound(format!("Offer not found: {}", offer_id)))?;

        if !offer.is_pending() {
            return Err(Error::ValidationError(format!("Offer {} is no longer pending", offer_id)));
        }

        let listing = self.require_listing(offer.listing_id).await?;

        if acceptor_id != listing.owner_id {
            return Err(Error::AuthorizationError(
                "Only the listing owner can accept an offer".to_string(),
            ));
        }
        if acceptor_id == offer.offeror_id {
            return Err(Error::SelfDealing(
                "You cannot accept your own offer".to_string(),
            ));
        }

        let balance = self.available_points(acceptor_id).await?;
        let context = Self::draft_context(
            offer.price_per_unit,
            Some(offer.quantity),
            &listing.unit,
            balance,
        );

        let built = OrderIntentBuilder::new(context)
            .build(draft)
            .map_err(Self::rejection_to_error)?;

        // Hold the acceptor's escrow before any record changes state
        self.ledger.hold(acceptor_id, built.intent.total_price).await?;

        offer.status = OfferStatus::Accepted;
        offer.updated_at = Utc::now();
        let offer = self.repo.update_offer(offer).await?;

        let order = Self::order_from_intent(
            listing.id,
            Some(offer.id),
            acceptor_id,
            offer.offeror_id,
            built.intent,
        );
        let order = self.repo.create_order(order).await?;

        info!("Offer {} accepted as order {}", offer_id, order.id);
        Ok(order)
    }

    /// Decline a pending offer; listing owner only
    pub async fn decline_offer(&self, actor_id: Uuid, offer_id: Uuid) -> Result<Offer> {
        let mut offer = self.repo.get_offer(offer_id).await?
            .ok_or_else(|| Error::OfferNotFound(format!("Offer not found: {}", offer_id)))?;

        if !offer.is_pending() {
            return Err(Error::ValidationError(format!("Offer {} is no longer pending", offer_id)));
        }

        let listing = self.require_listing(offer.listing_id).await?;
        if actor_id != listing.owner_id {
            return Err(Error::AuthorizationError(
                "Only the listing owner can decline an offer".to_string(),
            ));
        }

        offer.status = OfferStatus::Declined;
        offer.updated_at = Utc::now();
        self.repo.update_offer(offer).await
    }

    /// Withdraw a pending offer; offeror only
    pub async fn withdraw_offer(&self, actor_id: Uuid, offer_id: Uuid) -> Result<Offer> {
        let mut offer = self.repo.get_offer(offer_id).await?
            .ok_or_else(|| Error::OfferNotFound(format!("Offer not found: {}", offer_id)))?;

        if !offer.is_pending() {
            return Err(Error::ValidationError(format!("Offer {} is no longer pending", offer_id)));
        }
        if actor_id != offer.offeror_id {
            return Err(Error::AuthorizationError(
                "Only the offeror can withdraw an offer".to_string(),
            ));
        }

        offer.status = OfferStatus::Withdrawn;
        offer.updated_at = Utc::now();
        self.repo.update_offer(offer).await
    }

    /// Modify an open order
    ///
    /// Only the escrow delta is charged or refunded; the full new total is
    /// never re-held. Concurrent edits are last-write-wins.
    pub async fn modify_order(&self, actor_id: Uuid, order_id: Uuid, draft: &OrderDraft) -> Result<Order> {
        let mut order = self.require_order(order_id).await?;

        if actor_id != order.buyer_id {
            return Err(Error::AuthorizationError(
                "Only the buyer can modify an order".to_string(),
            ));
        }
        if !order.is_open() {
            return Err(Error::ValidationError(format!("Order {} can no longer be modified", order_id)));
        }

        let listing = self.require_listing(order.listing_id).await?;

        // This order's quantity is already consumed, so the cap is what is
        // left plus what the order holds
        let max_available = listing.quantity_available.map(|available| available + order.quantity);
        let balance = self.available_points(actor_id).await?;
        let context = Self::draft_context(order.price_per_unit, max_available, &listing.unit, balance);

        let built = OrderIntentBuilder::modifying(context, &order)
            .build(draft)
            .map_err(Self::rejection_to_error)?;

        let delta = built.delta
            .ok_or_else(|| Error::Internal("Modification built without a delta".to_string()))?;

        debug!(
            "Modifying order {}: quantity {} -> {}, delta +{}/-{}",
            order_id, order.quantity, built.intent.quantity, delta.additional_cost, delta.refund_amount
        );

        // Adjust the listing first so a failed escrow hold can be undone
        let old_quantity = order.quantity;
        let new_quantity = built.intent.quantity;
        if new_quantity > old_quantity && order.offer_id.is_none() {
            self.listings.consume_quantity(listing.id, new_quantity - old_quantity).await?;
            if let Err(e) = self.ledger.apply_delta(actor_id, &delta).await {
                self.listings.restore_quantity(listing.id, new_quantity - old_quantity).await?;
                return Err(e);
            }
        } else {
            if new_quantity < old_quantity && order.offer_id.is_none() {
                self.listings.restore_quantity(listing.id, old_quantity - new_quantity).await?;
            }
            self.ledger.apply_delta(actor_id, &delta).await?;
        }

        order.quantity = new_quantity;
        order.total_price = built.intent.total_price;
        order.delivery_address = built.intent.delivery_address;
        order.delivery_date = built.intent.delivery_date;
        order.instructions = built.intent.instructions;
        order.updated_at = Utc::now();

        let order = self.repo.update_order(order).await?;
        info!("Order {} modified", order_id);
        Ok(order)
    }

    /// Confirm a pending order; seller only
    pub async fn confirm_order(&self, actor_id: Uuid, order_id: Uuid) -> Result<Order> {
        let mut order = self.require_order(order_id).await?;

        if actor_id != order.seller_id {
            return Err(Error::AuthorizationError(
                "Only the seller can confirm an order".to_string(),
            ));
        }
        if order.status != OrderStatus::Pending {
            return Err(Error::ValidationError(format!("Order {} is not pending", order_id)));
        }

        order.status = OrderStatus::Confirmed;
        order.updated_at = Utc::now();
        self.repo.update_order(order).await
    }

    /// Cancel an open order, releasing escrow back to the buyer
    pub async fn cancel_order(&self, actor_id: Uuid, order_id: Uuid) -> Result<Order> {
        let mut order = self.require_order(order_id).await?;

        if actor_id != order.buyer_id && actor_id != order.seller_id {
            return Err(Error::AuthorizationError(
                "Only the buyer or seller can cancel an order".to_string(),
            ));
        }
        if !order.is_open() {
            return Err(Error::ValidationError(format!("Order {} can no longer be cancelled", order_id)));
        }

        self.ledger.release(order.buyer_id, order.total_price).await?;

        // Offer-born orders never consumed listing quantity
        if order.offer_id.is_none() {
            self.listings.restore_quantity(order.listing_id, order.quantity).await?;
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();

        let order = self.repo.update_order(order).await?;
        info!("Order {} cancelled by {}", order_id, actor_id);
        Ok(order)
    }

    /// Complete an open order; buyer confirms fulfilment and escrow
    /// settles to the seller
    pub async fn complete_order(&self, actor_id: Uuid, order_id: Uuid) -> Result<Order> {
        let mut order = self.require_order(order_id).await?;

        if actor_id != order.buyer_id {
            return Err(Error::AuthorizationError(
                "Only the buyer can complete an order".to_string(),
            ));
        }
        if !order.is_open() {
            return Err(Error::ValidationError(format!("Order {} can no longer be completed", order_id)));
        }

        self.ledger.settle(order.buyer_id, order.seller_id, order.total_price).await?;

        order.status = OrderStatus::Completed;
        order.updated_at = Utc::now();

        let order = self.repo.update_order(order).await?;
        info!("Order {} completed, {} points settled", order_id, order.total_price);
        Ok(order)
    }

    async fn require_listing(&self, listing_id: Uuid) -> Result<Listing> {
        self.listings.get_listing(listing_id).await?
            .ok_or_else(|| Error::ListingNotFound(format!("Listing not found: {}", listing_id)))
    }

    async fn require_order(&self, order_id: Uuid) -> Result<Order> {
        self.repo.get_order(order_id).await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))
    }

    async fn require_account(&self, account_id: Uuid) -> Result<()> {
        self.ledger.get_account(account_id).await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;
        Ok(())
    }

    /// The account's available points, zero when no balance row exists yet
    async fn available_points(&self, account_id: Uuid) -> Result<Points> {
        self.require_account(account_id).await?;
        Ok(self.ledger.get_balance(account_id).await?
            .map(|balance| balance.available)
            .unwrap_or(Points::ZERO))
    }

    fn draft_context(
        price_per_unit: PricePerUnit,
        max_available: Option<Quantity>,
        unit: &str,
        current_balance: Points,
    ) -> DraftContext {
        DraftContext {
            price_per_unit,
            max_available,
            unit: unit.to_string(),
            current_balance,
            today: Utc::now().date_naive(),
        }
    }

    fn order_from_intent(
        listing_id: Uuid,
        offer_id: Option<Uuid>,
        buyer_id: Uuid,
        seller_id: Uuid,
        intent: OrderIntent,
    ) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            listing_id,
            offer_id,
            buyer_id,
            seller_id,
            quantity: intent.quantity,
            price_per_unit: intent.price_per_unit,
            total_price: intent.total_price,
            delivery_address: intent.delivery_address,
            delivery_date: intent.delivery_date,
            additional_dates: intent.additional_dates,
            instructions: intent.instructions,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    fn rejection_to_error(rejection: BuildRejection) -> Error {
        match rejection {
            BuildRejection::MissingRequiredFields(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
                Error::MissingFields(names.join(", "))
            }
            BuildRejection::ExceedsAvailableQuantity { max, unit } => {
                Error::ExceedsAvailable(format!("at most {} {} available", max, unit))
            }
            BuildRejection::InsufficientBalance { shortfall } => {
                Error::InsufficientPoints(format!("{} more points needed", shortfall))
            }
            BuildRejection::NoChanges => {
                Error::NoChanges("proposed values match the existing order".to_string())
            }
        }
    }
}
