//! Listing service for the marketplace feed and moderation

pub mod models;
pub mod repository;
pub mod service;

pub use models::{FeedFilter, FeedSnapshot};
pub use repository::{ListingRepository, InMemoryListingRepository, PostgresListingRepository};
pub use service::ListingService;
