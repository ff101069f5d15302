// api-gateway/src/lib.rs
pub mod api;
pub mod error;
pub mod config;

use std::sync::Arc;
use ledger_service::LedgerService;
use listing_service::ListingService;
use order_service::OrderService;

/// App state shared across handlers
pub struct AppState {
    /// Points ledger (accounts, balances, escrow)
    pub ledger: Arc<LedgerService>,
    /// Listings, feed, and moderation
    pub listings: Arc<ListingService>,
    /// Order and offer submission
    pub orders: Arc<OrderService>,
}
