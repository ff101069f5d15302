use common::error::Error;
use common::model::order::{Order, OrderStatus};
use common::points::dec;
use ledger_service::{EffectivePoints, LedgerService};
use pricing_engine::compute_delta;
use uuid::Uuid;

fn create_test_order(buyer_id: Uuid, quantity: rust_decimal::Decimal, price: rust_decimal::Decimal) -> Order {
    Order {
        id: Uuid::new_v4(),
        listing_id: Uuid::new_v4(),
        offer_id: None,
        buyer_id,
        seller_id: Uuid::new_v4(),
        quantity,
        price_per_unit: price,
        total_price: pricing_engine::compute_total(quantity, price),
        delivery_address: "12 Orchard Lane".to_string(),
        delivery_date: chrono::Utc::now().date_naive(),
        additional_dates: Vec::new(),
        instructions: None,
        status: OrderStatus::Pending,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn test_top_up_requires_positive_amount() {
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();

    let result = service.top_up(account.id, dec!(0)).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let result = service.top_up(account.id, dec!(-10)).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_top_up_unknown_account() {
    let service = LedgerService::new();

    let result = service.top_up(Uuid::new_v4(), dec!(100)).await;
    assert!(matches!(result, Err(Error::AccountNotFound(_))));
}

#[tokio::test]
async fn test_hold_insufficient_points() {
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();
    service.top_up(account.id, dec!(50)).await.unwrap();

    let result = service.hold(account.id, dec!(100)).await;
    assert!(matches!(result, Err(Error::InsufficientPoints(_))));

    // The failed hold left the balance untouched
    let balance = service.get_balance(account.id).await.unwrap().unwrap();
    assert_eq!(balance.available, dec!(50));
    assert_eq!(balance.held, dec!(0));
}

#[tokio::test]
async fn test_apply_delta_increase() {
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();
    service.top_up(account.id, dec!(100)).await.unwrap();

    // An order of 10 @ 5 holds 50 points
    let order = create_test_order(account.id, dec!(10), dec!(5));
    service.hold(account.id, order.total_price).await.unwrap();

    // Growing to 14 units holds exactly 20 more
    let delta = compute_delta(&order, dec!(14));
    let balance = service.apply_delta(account.id, &delta).await.unwrap();

    assert_eq!(balance.held, dec!(70));
    assert_eq!(balance.available, dec!(30));
    assert_eq!(balance.total, dec!(100));
}

#[tokio::test]
async fn test_apply_delta_decrease() {
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();
    service.top_up(account.id, dec!(100)).await.unwrap();

    let order = create_test_order(account.id, dec!(10), dec!(5));
    service.hold(account.id, order.total_price).await.unwrap();

    // Shrinking to 6 units releases exactly 20
    let delta = compute_delta(&order, dec!(6));
    let balance = service.apply_delta(account.id, &delta).await.unwrap();

    assert_eq!(balance.held, dec!(30));
    assert_eq!(balance.available, dec!(70));
    assert_eq!(balance.total, dec!(100));
}

#[tokio::test]
async fn test_apply_delta_noop() {
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();
    service.top_up(account.id, dec!(100)).await.unwrap();

    let order = create_test_order(account.id, dec!(10), dec!(5));
    service.hold(account.id, order.total_price).await.unwrap();

    let delta = compute_delta(&order, order.quantity);
    let balance = service.apply_delta(account.id, &delta).await.unwrap();

    assert_eq!(balance.held, dec!(50));
    assert_eq!(balance.available, dec!(50));
}

#[tokio::test]
async fn test_apply_delta_insufficient_for_increase() {
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();
    service.top_up(account.id, dec!(60)).await.unwrap();

    let order = create_test_order(account.id, dec!(10), dec!(5));
    service.hold(account.id, order.total_price).await.unwrap();

    // Only 10 available; growing to 14 needs 20 more
    let delta = compute_delta(&order, dec!(14));
    let result = service.apply_delta(account.id, &delta).await;

    assert!(matches!(result, Err(Error::InsufficientPoints(_))));
}

#[tokio::test]
async fn test_settle_requires_held_points() {
    let service = LedgerService::new();
    let buyer = service.create_account("amara").await.unwrap();
    let seller = service.create_account("jonas").await.unwrap();

    service.top_up(buyer.id, dec!(100)).await.unwrap();
    service.hold(buyer.id, dec!(40)).await.unwrap();

    // Settling more than is held fails and moves nothing
    let result = service.settle(buyer.id, seller.id, dec!(60)).await;
    assert!(matches!(result, Err(Error::InsufficientPoints(_))));

    let buyer_balance = service.get_balance(buyer.id).await.unwrap().unwrap();
    assert_eq!(buyer_balance.held, dec!(40));
    assert_eq!(buyer_balance.total, dec!(100));
    assert!(service.get_balance(seller.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_effective_points_top_up_detour() {
    // The in-flow recovery path: shortfall, optimistic top-up, reconcile
    let service = LedgerService::new();
    let account = service.create_account("amara").await.unwrap();
    service.top_up(account.id, dec!(10)).await.unwrap();

    let balance = service.get_balance(account.id).await.unwrap().unwrap();
    let mut effective = EffectivePoints::new(balance.available);

    // Form needs 25 points; the member buys the 15-point shortfall
    effective.observe_top_up(dec!(15));
    assert_eq!(effective.current(), dec!(25));

    // Provider confirms and the refresh reconciles the local copy
    service.top_up(account.id, dec!(15)).await.unwrap();
    let fresh = service.get_balance(account.id).await.unwrap().unwrap();
    effective.reconcile(fresh.available);

    assert_eq!(effective.current(), dec!(25));
    assert!(!effective.is_optimistic());
}
