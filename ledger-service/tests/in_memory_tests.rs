use common::points::{dec, Points};
use common::model::account::{Account, PointsBalance};
use ledger_service::{LedgerService, InMemoryLedgerRepository, RepositoryType};
use uuid::Uuid;

#[tokio::test]
async fn test_create_account() {
    let repo = InMemoryLedgerRepository::new();
    let account_id = Uuid::new_v4();

    // Verify basic operations
    assert!(repo.accounts.is_empty());

    // Add an account
    let account = Account {
        id: account_id,
        display_name: "amara".to_string(),
        staff: false,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    repo.accounts.insert(account_id, account);

    // Check it was added
    assert_eq!(repo.accounts.len(), 1);
    assert!(repo.accounts.contains_key(&account_id));
}

#[tokio::test]
async fn test_balance_operations() {
    let account_id = Uuid::new_v4();

    // Create a balance
    let mut balance = PointsBalance::new(account_id);

    // Test grant
    balance.grant(dec!(100));
    assert_eq!(balance.total, dec!(100));
    assert_eq!(balance.available, dec!(100));

    // Test hold
    balance.hold(dec!(40)).unwrap();
    assert_eq!(balance.total, dec!(100));
    assert_eq!(balance.available, dec!(60));
    assert_eq!(balance.held, dec!(40));

    // Test release
    balance.release(dec!(15));
    assert_eq!(balance.total, dec!(100));
    assert_eq!(balance.available, dec!(75));
    assert_eq!(balance.held, dec!(25));

    // Test settlement debit on the buyer side
    balance.debit_held(dec!(25)).unwrap();
    assert_eq!(balance.total, dec!(75));
    assert_eq!(balance.available, dec!(75));
    assert_eq!(balance.held, Points::ZERO);

    // Holding more than available fails
    let hold_result = balance.hold(dec!(100));
    assert!(hold_result.is_err());
}

#[tokio::test]
async fn test_balance_conservation() {
    let mut balance = PointsBalance::new(Uuid::new_v4());

    balance.grant(dec!(200));
    balance.hold(dec!(120)).unwrap();
    balance.release(dec!(20));

    // total always equals available + held
    assert_eq!(balance.total, balance.available + balance.held);

    balance.debit_held(dec!(100)).unwrap();
    assert_eq!(balance.total, balance.available + balance.held);
}

#[tokio::test]
async fn test_ledger_service_operations() {
    // Create service with in-memory repository
    let service = LedgerService::with_repository(RepositoryType::InMemory).await.unwrap();

    // Create account
    let account = service.create_account("amara").await.unwrap();
    assert!(account.id != Uuid::nil());
    assert!(!account.staff);

    // Top up points
    service.top_up(account.id, dec!(500)).await.unwrap();

    // Check balance
    let balance = service.get_balance(account.id).await.unwrap().unwrap();
    assert_eq!(balance.total, dec!(500));
    assert_eq!(balance.available, dec!(500));
    assert_eq!(balance.held, Points::ZERO);

    // Hold escrow for an order
    service.hold(account.id, dec!(200)).await.unwrap();

    let held = service.get_balance(account.id).await.unwrap().unwrap();
    assert_eq!(held.available, dec!(300));
    assert_eq!(held.held, dec!(200));
    assert_eq!(held.total, dec!(500));
}

#[tokio::test]
async fn test_settlement() {
    // Create service
    let service = LedgerService::with_repository(RepositoryType::InMemory).await.unwrap();

    // Create buyer and seller accounts
    let buyer = service.create_account("amara").await.unwrap();
    let seller = service.create_account("jonas").await.unwrap();

    // Fund the buyer and hold the order total
    service.top_up(buyer.id, dec!(1000)).await.unwrap();
    service.hold(buyer.id, dec!(300)).await.unwrap();

    // Settle the order
    service.settle(buyer.id, seller.id, dec!(300)).await.unwrap();

    // Verify final balances
    let buyer_balance = service.get_balance(buyer.id).await.unwrap().unwrap();
    let seller_balance = service.get_balance(seller.id).await.unwrap().unwrap();

    assert_eq!(buyer_balance.total, dec!(700)); // 1000 - 300
    assert_eq!(buyer_balance.available, dec!(700));
    assert_eq!(buyer_balance.held, Points::ZERO);

    assert_eq!(seller_balance.total, dec!(300));
    assert_eq!(seller_balance.available, dec!(300));
    assert_eq!(seller_balance.held, Points::ZERO);
}
