use std::sync::Arc;

use chrono::Duration;
use common::error::Error;
use common::model::listing::{Listing, ListingKind, ListingStatus};
use common::points::dec;
use listing_service::{FeedFilter, InMemoryListingRepository, ListingRepository, ListingService};
use uuid::Uuid;

async fn create_produce_listing(service: &ListingService, owner: Uuid) -> Listing {
    service.create_listing(
        owner,
        ListingKind::Sell,
        "Fresh tomatoes",
        "Garden tomatoes picked this morning",
        "produce",
        dec!(5),
        "kg",
        Some(dec!(10)),
    ).await.unwrap()
}

#[tokio::test]
async fn test_create_listing() {
    let service = ListingService::new();
    let owner = Uuid::new_v4();

    let listing = create_produce_listing(&service, owner).await;

    assert_eq!(listing.owner_id, owner);
    assert_eq!(listing.status, ListingStatus::Active);
    assert_eq!(listing.quantity_available, Some(dec!(10)));
}

#[tokio::test]
async fn test_create_listing_validation() {
    let service = ListingService::new();
    let owner = Uuid::new_v4();

    let result = service.create_listing(
        owner, ListingKind::Sell, "  ", "desc", "produce", dec!(5), "kg", None,
    ).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let result = service.create_listing(
        owner, ListingKind::Sell, "Tomatoes", "desc", "produce", dec!(-1), "kg", None,
    ).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_feed_filters() {
    let service = ListingService::new();
    let owner = Uuid::new_v4();

    create_produce_listing(&service, owner).await;
    service.create_listing(
        owner,
        ListingKind::Service,
        "Bike repair",
        "Tune-ups and flat fixes",
        "services",
        dec!(20),
        "hour",
        None,
    ).await.unwrap();

    // No filter returns everything
    let all = service.feed(&FeedFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    // Kind filter
    let filter = FeedFilter { kind: Some(ListingKind::Service), ..Default::default() };
    let services = service.feed(&filter).await.unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].title, "Bike repair");

    // Category filter is case-insensitive
    let filter = FeedFilter { category: Some("Produce".to_string()), ..Default::default() };
    assert_eq!(service.feed(&filter).await.unwrap().len(), 1);

    // Query searches title and description
    let filter = FeedFilter { query: Some("flat".to_string()), ..Default::default() };
    let matched = service.feed(&filter).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Bike repair");

    // Max price
    let filter = FeedFilter { max_price: Some(dec!(10)), ..Default::default() };
    let cheap = service.feed(&filter).await.unwrap();
    assert_eq!(cheap.len(), 1);
    assert_eq!(cheap[0].title, "Fresh tomatoes");
}

#[tokio::test]
async fn test_feed_cache_serves_snapshot_until_invalidated() {
    let repo = Arc::new(InMemoryListingRepository::new());
    let service = ListingService::with_repository(repo.clone())
        .with_feed_ttl(Duration::seconds(3600));
    let owner = Uuid::new_v4();

    create_produce_listing(&service, owner).await;
    assert_eq!(service.feed(&FeedFilter::default()).await.unwrap().len(), 1);

    // Insert behind the service's back: the fresh snapshot hides it
    let hidden = Listing::new(
        owner,
        ListingKind::Sell,
        "Eggs".to_string(),
        "Free range".to_string(),
        "produce".to_string(),
        dec!(2),
        "dozen".to_string(),
        None,
    );
    repo.create_listing(hidden).await.unwrap();
    assert_eq!(service.feed(&FeedFilter::default()).await.unwrap().len(), 1);

    // Invalidating forces a refresh that picks it up
    service.invalidate_feed().await;
    assert_eq!(service.feed(&FeedFilter::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_consume_and_restore_quantity() {
    let service = ListingService::new();
    let owner = Uuid::new_v4();
    let listing = create_produce_listing(&service, owner).await;

    let updated = service.consume_quantity(listing.id, dec!(4)).await.unwrap();
    assert_eq!(updated.quantity_available, Some(dec!(6)));

    // Consuming more than is available fails
    let result = service.consume_quantity(listing.id, dec!(7)).await;
    assert!(matches!(result, Err(Error::ExceedsAvailable(_))));

    // Selling out completes the listing
    let sold_out = service.consume_quantity(listing.id, dec!(6)).await.unwrap();
    assert_eq!(sold_out.quantity_available, Some(dec!(0)));
    assert_eq!(sold_out.status, ListingStatus::Completed);

    // Restoring re-opens it
    let restored = service.restore_quantity(listing.id, dec!(6)).await.unwrap();
    assert_eq!(restored.quantity_available, Some(dec!(6)));
    assert_eq!(restored.status, ListingStatus::Active);
}

#[tokio::test]
async fn test_flag_and_resolve() {
    let service = ListingService::new();
    let owner = Uuid::new_v4();
    let reporter = Uuid::new_v4();
    let listing = create_produce_listing(&service, owner).await;

    let flag = service.flag_listing(reporter, listing.id, "spam").await.unwrap();
    assert_eq!(service.open_flags().await.unwrap().len(), 1);

    // Non-staff cannot resolve
    let member = common::model::account::Account::new("amara".to_string());
    let result = service.resolve_flag(&member, flag.id, true).await;
    assert!(matches!(result, Err(Error::AuthorizationError(_))));

    // Staff upholding the flag removes the listing
    let mut staff = common::model::account::Account::new("dana".to_string());
    staff.staff = true;
    service.resolve_flag(&staff, flag.id, true).await.unwrap();

    assert!(service.open_flags().await.unwrap().is_empty());
    let removed = service.get_listing(listing.id).await.unwrap().unwrap();
    assert_eq!(removed.status, ListingStatus::Removed);

    // A resolved flag cannot be resolved again
    let result = service.resolve_flag(&staff, flag.id, false).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_comments() {
    let service = ListingService::new();
    let owner = Uuid::new_v4();
    let commenter = Uuid::new_v4();
    let listing = create_produce_listing(&service, owner).await;

    service.add_comment(commenter, listing.id, "Are these organic?").await.unwrap();
    service.add_comment(owner, listing.id, "Yes, no spray at all.").await.unwrap();

    let comments = service.comments_for_listing(listing.id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].body, "Are these organic?");

    // Empty comments are rejected
    let result = service.add_comment(commenter, listing.id, "   ").await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}
