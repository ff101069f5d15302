use chrono::NaiveDate;
use common::model::order::{Order, OrderStatus};
use common::points::{dec, Points, PricePerUnit, Quantity};
use pricing_engine::{
    compute_balance_check, compute_delta, compute_total, exceeds_max, parse_quantity,
    BuildRejection, DraftContext, DraftField, OrderDraft, OrderIntentBuilder,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn create_test_order(quantity: Quantity, price_per_unit: PricePerUnit) -> Order {
    Order {
        id: Uuid::new_v4(),
        listing_id: Uuid::new_v4(),
        offer_id: None,
        buyer_id: Uuid::new_v4(),
        seller_id: Uuid::new_v4(),
        quantity,
        price_per_unit,
        total_price: compute_total(quantity, price_per_unit),
        delivery_address: "12 Orchard Lane".to_string(),
        delivery_date: today(),
        additional_dates: Vec::new(),
        instructions: None,
        status: OrderStatus::Pending,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

fn create_context(balance: Points, price: PricePerUnit, max: Option<Quantity>) -> DraftContext {
    DraftContext {
        price_per_unit: price,
        max_available: max,
        unit: "kg".to_string(),
        current_balance: balance,
        today: today(),
    }
}

fn create_draft(quantity: &str) -> OrderDraft {
    OrderDraft {
        quantity: quantity.to_string(),
        delivery_address: "12 Orchard Lane".to_string(),
        delivery_date: Some(today()),
        additional_dates: Vec::new(),
        instructions: None,
    }
}

#[test]
fn test_compute_total() {
    assert_eq!(compute_total(dec!(20), dec!(5)), dec!(100));
    assert_eq!(compute_total(dec!(0), dec!(5)), dec!(0));
    assert_eq!(compute_total(dec!(5), dec!(0)), dec!(0));
    assert_eq!(compute_total(dec!(-1), dec!(5)), dec!(0));
}

#[test]
fn test_compute_total_rounds_half_up() {
    // 0.5 kg at 5 points/kg is 2.5 points, rounded up to 3
    assert_eq!(compute_total(dec!(0.5), dec!(5)), dec!(3));
    // 0.3 kg at 5 points/kg is 1.5 points, rounded up to 2
    assert_eq!(compute_total(dec!(0.3), dec!(5)), dec!(2));
    // 1.4 points rounds down
    assert_eq!(compute_total(dec!(0.28), dec!(5)), dec!(1));
}

#[test]
fn test_compute_balance_check() {
    let check = compute_balance_check(dec!(100), compute_total(dec!(4), dec!(10)));
    assert_eq!(check.balance_after, dec!(60));
    assert!(check.is_sufficient);
    assert_eq!(check.shortfall, dec!(0));

    let check = compute_balance_check(dec!(30), dec!(45));
    assert_eq!(check.balance_after, dec!(-15));
    assert!(!check.is_sufficient);
    assert_eq!(check.shortfall, dec!(15));

    // A zero total is always sufficient
    let check = compute_balance_check(dec!(0), dec!(0));
    assert!(check.is_sufficient);
}

#[test]
fn test_exceeds_max() {
    assert!(!exceeds_max(dec!(10), None));
    assert!(!exceeds_max(dec!(10), Some(dec!(10))));
    assert!(exceeds_max(dec!(11), Some(dec!(10))));
    assert!(!exceeds_max(dec!(9), Some(dec!(10))));
}

#[test]
fn test_parse_quantity_permissive() {
    assert_eq!(parse_quantity("2.5"), dec!(2.5));
    assert_eq!(parse_quantity("  3 "), dec!(3));
    assert_eq!(parse_quantity(""), dec!(0));
    assert_eq!(parse_quantity("abc"), dec!(0));
}

#[test]
fn test_delta_idempotence() {
    let order = create_test_order(dec!(10), dec!(5));
    let delta = compute_delta(&order, order.quantity);

    assert_eq!(delta.additional_cost, dec!(0));
    assert_eq!(delta.refund_amount, dec!(0));
    assert!(delta.is_noop());
}

#[test]
fn test_delta_sign_correctness() {
    let order = create_test_order(dec!(10), dec!(5));

    // Increasing quantity never refunds
    let delta = compute_delta(&order, dec!(12));
    assert_eq!(delta.refund_amount, dec!(0));
    assert!(delta.additional_cost > dec!(0));

    // Decreasing quantity never charges
    let delta = compute_delta(&order, dec!(8));
    assert_eq!(delta.additional_cost, dec!(0));
    assert!(delta.refund_amount > dec!(0));
}

#[test]
fn test_delta_zero_quantity_full_refund() {
    let order = create_test_order(dec!(10), dec!(5));
    let delta = compute_delta(&order, dec!(0));

    assert_eq!(delta.refund_amount, dec!(50));
    assert_eq!(delta.additional_cost, dec!(0));
}

#[test]
fn test_build_empty_quantity_fails() {
    let builder = OrderIntentBuilder::new(create_context(dec!(1000), dec!(5), None));
    let result = builder.build(&create_draft(""));

    match result {
        Err(BuildRejection::MissingRequiredFields(fields)) => {
            assert!(fields.contains(&DraftField::Quantity));
        }
        other => panic!("Expected MissingRequiredFields, got {:?}", other),
    }
}

#[test]
fn test_build_unparsable_quantity_fails_like_empty() {
    let builder = OrderIntentBuilder::new(create_context(dec!(1000), dec!(5), None));
    let result = builder.build(&create_draft("abc"));

    match result {
        Err(BuildRejection::MissingRequiredFields(fields)) => {
            assert_eq!(fields, vec![DraftField::Quantity]);
        }
        other => panic!("Expected MissingRequiredFields, got {:?}", other),
    }
}

#[test]
fn test_build_collects_all_missing_fields() {
    let builder = OrderIntentBuilder::new(create_context(dec!(1000), dec!(5), None));
    let draft = OrderDraft {
        quantity: String::new(),
        delivery_address: "   ".to_string(),
        delivery_date: None,
        additional_dates: Vec::new(),
        instructions: None,
    };

    match builder.build(&draft) {
        Err(BuildRejection::MissingRequiredFields(fields)) => {
            assert_eq!(fields.len(), 3);
        }
        other => panic!("Expected MissingRequiredFields, got {:?}", other),
    }
}

#[test]
fn test_build_past_delivery_date_fails() {
    let builder = OrderIntentBuilder::new(create_context(dec!(1000), dec!(5), None));
    let mut draft = create_draft("2");
    draft.delivery_date = Some(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

    match builder.build(&draft) {
        Err(BuildRejection::MissingRequiredFields(fields)) => {
            assert_eq!(fields, vec![DraftField::DeliveryDate]);
        }
        other => panic!("Expected MissingRequiredFields, got {:?}", other),
    }
}

#[test]
fn test_build_exceeds_available_quantity() {
    let builder = OrderIntentBuilder::new(create_context(dec!(1000), dec!(5), Some(dec!(10))));
    let result = builder.build(&create_draft("11"));

    match result {
        Err(BuildRejection::ExceedsAvailableQuantity { max, unit }) => {
            assert_eq!(max, dec!(10));
            assert_eq!(unit, "kg");
        }
        other => panic!("Expected ExceedsAvailableQuantity, got {:?}", other),
    }

    // Quantity exactly at the cap is allowed
    assert!(builder.build(&create_draft("10")).is_ok());
}

#[test]
fn test_build_exact_balance_succeeds() {
    // balance=100, quantity=20, price=5: total 100, nothing left over
    let builder = OrderIntentBuilder::new(create_context(dec!(100), dec!(5), None));
    let built = builder.build(&create_draft("20")).unwrap();

    assert_eq!(built.intent.total_price, dec!(100));
    assert_eq!(built.balance.balance_after, dec!(0));
    assert!(built.balance.is_sufficient);
    assert!(built.delta.is_none());
}

#[test]
fn test_build_insufficient_balance() {
    // balance=10, quantity=5, price=5: total 25, short 15
    let builder = OrderIntentBuilder::new(create_context(dec!(10), dec!(5), None));
    let result = builder.build(&create_draft("5"));

    match result {
        Err(BuildRejection::InsufficientBalance { shortfall }) => {
            assert_eq!(shortfall, dec!(15));
        }
        other => panic!("Expected InsufficientBalance, got {:?}", other),
    }

    let rejection = BuildRejection::InsufficientBalance { shortfall: dec!(15) };
    assert!(rejection.is_recoverable());
    assert_eq!(rejection.code(), "insufficient_balance");
}

#[test]
fn test_build_top_up_then_retry() {
    // The insufficient-balance detour: same draft, refreshed balance
    let draft = create_draft("5");

    let before = OrderIntentBuilder::new(create_context(dec!(10), dec!(5), None));
    assert!(before.build(&draft).is_err());

    let after = OrderIntentBuilder::new(create_context(dec!(25), dec!(5), None));
    let built = after.build(&draft).unwrap();
    assert_eq!(built.balance.balance_after, dec!(0));
}

#[test]
fn test_modify_decrease_refunds() {
    // Existing 10 @ 5 (total 50); modify to 6: refund 20
    let order = create_test_order(dec!(10), dec!(5));
    let builder = OrderIntentBuilder::modifying(create_context(dec!(40), dec!(5), None), &order);
    let built = builder.build(&create_draft("6")).unwrap();

    let delta = built.delta.unwrap();
    assert_eq!(delta.new_total, dec!(30));
    assert_eq!(delta.refund_amount, dec!(20));
    assert_eq!(delta.additional_cost, dec!(0));
    assert_eq!(delta.balance_after(dec!(40)), dec!(60));
}

#[test]
fn test_modify_increase_charges_delta_only() {
    // Existing 10 @ 5 (total 50); modify to 14: charge 20 more
    let order = create_test_order(dec!(10), dec!(5));
    let builder = OrderIntentBuilder::modifying(create_context(dec!(40), dec!(5), None), &order);
    let built = builder.build(&create_draft("14")).unwrap();

    let delta = built.delta.unwrap();
    assert_eq!(delta.new_total, dec!(70));
    assert_eq!(delta.additional_cost, dec!(20));
    assert_eq!(delta.refund_amount, dec!(0));
    assert_eq!(delta.balance_after(dec!(40)), dec!(20));

    // The balance check covers the delta, not the full new total
    assert_eq!(built.balance.total_price, dec!(20));
}

#[test]
fn test_modify_increase_insufficient_for_delta() {
    let order = create_test_order(dec!(10), dec!(5));
    let builder = OrderIntentBuilder::modifying(create_context(dec!(15), dec!(5), None), &order);

    // Needs 20 more points, only 15 available
    match builder.build(&create_draft("14")) {
        Err(BuildRejection::InsufficientBalance { shortfall }) => {
            assert_eq!(shortfall, dec!(5));
        }
        other => panic!("Expected InsufficientBalance, got {:?}", other),
    }
}

#[test]
fn test_modify_no_changes() {
    let order = create_test_order(dec!(10), dec!(5));
    let builder = OrderIntentBuilder::modifying(create_context(dec!(100), dec!(5), None), &order);

    let draft = OrderDraft {
        quantity: "10".to_string(),
        delivery_address: order.delivery_address.clone(),
        delivery_date: Some(order.delivery_date),
        additional_dates: Vec::new(),
        instructions: None,
    };

    match builder.build(&draft) {
        Err(BuildRejection::NoChanges) => {}
        other => panic!("Expected NoChanges, got {:?}", other),
    }
}

#[test]
fn test_modify_address_only_is_a_change() {
    let order = create_test_order(dec!(10), dec!(5));
    let builder = OrderIntentBuilder::modifying(create_context(dec!(100), dec!(5), None), &order);

    let draft = OrderDraft {
        quantity: "10".to_string(),
        delivery_address: "7 Mill Road".to_string(),
        delivery_date: Some(order.delivery_date),
        additional_dates: Vec::new(),
        instructions: None,
    };

    let built = builder.build(&draft).unwrap();
    assert!(built.delta.unwrap().is_noop());
    assert_eq!(built.intent.delivery_address, "7 Mill Road");
}

#[test]
fn test_intent_normalizes_address() {
    let builder = OrderIntentBuilder::new(create_context(dec!(100), dec!(5), None));
    let mut draft = create_draft("2");
    draft.delivery_address = "  12 Orchard Lane  ".to_string();

    let built = builder.build(&draft).unwrap();
    assert_eq!(built.intent.delivery_address, "12 Orchard Lane");
}
