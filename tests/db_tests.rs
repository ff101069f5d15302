// Database persistence tests for the marketplace schema

#[cfg(feature = "db_tests")]
mod db_persistence_tests {
    use sqlx::Row;
    use std::env;
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use uuid::Uuid;

    // Connect to the test database, or skip when it is not configured
    async fn test_pool() -> Option<PgPool> {
        let db_url = match env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("Skipping database test: TEST_DATABASE_URL not set");
                return None;
            }
        };

        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                println!("Skipping database test: could not connect to database: {}", err);
                None
            }
        }
    }

    #[tokio::test]
    #[ignore = "Requires test database, run with RUST_TEST_THREADS=1 cargo test --features db_tests -- --ignored"]
    async fn test_account_and_balance_persistence() {
        let pool = match test_pool().await {
            Some(pool) => pool,
            None => return,
        };

        common::db::run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");

        let account_id = Uuid::new_v4();

        sqlx::query("INSERT INTO accounts (id, display_name, staff) VALUES ($1, $2, $3)")
            .bind(account_id)
            .bind("db-test-member")
            .bind(false)
            .execute(&pool)
            .await
            .expect("Failed to insert account");

        // Upsert a balance twice; the second write wins
        for (total, available) in [("100", "100"), ("100", "60")] {
            sqlx::query(
                "INSERT INTO balances (account_id, total, available, held)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (account_id)
                 DO UPDATE SET total = $2, available = $3, held = $4"
            )
            .bind(account_id)
            .bind(total)
            .bind(available)
            .bind("40")
            .execute(&pool)
            .await
            .expect("Failed to upsert balance");
        }

        let row = sqlx::query("SELECT total, available, held FROM balances WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to read balance");

        assert_eq!(row.get::<&str, _>("total"), "100");
        assert_eq!(row.get::<&str, _>("available"), "60");
        assert_eq!(row.get::<&str, _>("held"), "40");

        // Clean up
        sqlx::query("DELETE FROM balances WHERE account_id = $1")
            .bind(account_id)
            .execute(&pool)
            .await
            .expect("Failed to clean up balance");
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&pool)
            .await
            .expect("Failed to clean up account");
    }

    #[tokio::test]
    #[ignore = "Requires test database, run with RUST_TEST_THREADS=1 cargo test --features db_tests -- --ignored"]
    async fn test_settlement_transaction_rollback() {
        let pool = match test_pool().await {
            Some(pool) => pool,
            None => return,
        };

        common::db::run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");

        let account_id = Uuid::new_v4();

        sqlx::query("INSERT INTO accounts (id, display_name, staff) VALUES ($1, $2, $3)")
            .bind(account_id)
            .bind("db-test-rollback")
            .bind(false)
            .execute(&pool)
            .await
            .expect("Failed to insert account");

        // Write a balance inside a transaction, then roll back
        let mut tx = pool.begin().await.expect("Failed to start transaction");

        sqlx::query(
            "INSERT INTO balances (account_id, total, available, held) VALUES ($1, $2, $3, $4)"
        )
        .bind(account_id)
        .bind("500")
        .bind("500")
        .bind("0")
        .execute(&mut *tx)
        .await
        .expect("Failed to insert balance");

        tx.rollback().await.expect("Failed to rollback transaction");

        // The rolled-back balance must not exist
        let row = sqlx::query("SELECT 1 FROM balances WHERE account_id = $1")
            .bind(account_id)
            .fetch_optional(&pool)
            .await
            .expect("Failed to read balance");

        assert!(row.is_none(), "Rollback should have prevented the balance from persisting");

        // Clean up
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&pool)
            .await
            .expect("Failed to clean up account");
    }
}
