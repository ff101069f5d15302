//! Repository for account and balance data

use async_trait::async_trait;
use chrono::Utc;
use common::error::{Error, Result};
use common::model::account::{Account, PointsBalance};
use common::points::Points;
use common::{DBTransaction, TransactionManager};
use common::db::{PgTransactionManager, InMemoryTransactionManager};
use dashmap::DashMap;
use sqlx::{PgPool, postgres::PgPoolOptions, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Ledger repository trait defining the interface for account data storage
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Create a new account
    async fn create_account(&self, display_name: &str, staff: bool) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get an account's balance
    async fn get_balance(&self, account_id: Uuid) -> Result<Option<PointsBalance>>;

    /// Create or update a balance
    async fn update_balance(&self, balance: PointsBalance) -> Result<PointsBalance>;

    /// Ensure a balance exists, creating it if necessary
    async fn ensure_balance(&self, account_id: Uuid) -> Result<PointsBalance>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for account data
pub struct InMemoryLedgerRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, Account>,
    /// Balances by account ID
    pub balances: DashMap<Uuid, PointsBalance>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryLedgerRepository {
    /// Create a new in-memory ledger repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            balances: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    /// Create a new account
    async fn create_account(&self, display_name: &str, staff: bool) -> Result<Account> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            staff,
            created_at: now,
            updated_at: now,
        };

        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    /// Get a balance
    async fn get_balance(&self, account_id: Uuid) -> Result<Option<PointsBalance>> {
        Ok(self.balances.get(&account_id).map(|b| b.clone()))
    }

    /// Create or update a balance
    async fn update_balance(&self, balance: PointsBalance) -> Result<PointsBalance> {
        self.balances.insert(balance.account_id, balance.clone());
        Ok(balance)
    }

    /// Ensure a balance exists, creating it if necessary
    async fn ensure_balance(&self, account_id: Uuid) -> Result<PointsBalance> {
        if let Some(balance) = self.balances.get(&account_id) {
            Ok(balance.clone())
        } else {
            // Check if the account exists
            if !self.accounts.contains_key(&account_id) {
                return Err(Error::AccountNotFound(format!("Account not found: {}", account_id)));
            }

            let balance = PointsBalance::new(account_id);
            self.balances.insert(account_id, balance.clone());
            Ok(balance)
        }
    }
}

/// PostgreSQL repository for account data
pub struct PostgresLedgerRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
    /// Enable transaction logging
    #[allow(dead_code)]
    transaction_logging: bool,
}

impl PostgresLedgerRepository {
    /// Create a new PostgreSQL ledger repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let pool = match database_url {
            Some(url) => {
                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await
                    .map_err(Error::Database)?
            },
            None => {
                let database_url = std::env::var("DATABASE_URL")
                    .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?;

                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database_url)
                    .await
                    .map_err(Error::Database)?
            },
        };

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
            transaction_logging: false
        })
    }

    /// Create a new PostgreSQL ledger repository with configuration
    pub async fn with_config(config: &crate::config::LedgerServiceConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
            transaction_logging: config.transaction_logging
        })
    }

    /// Parse a stored point amount
    fn parse_points(value: &str, column: &str) -> Result<Points> {
        value.parse::<Points>()
            .map_err(|e| Error::Internal(format!("Invalid {} balance format: {}", column, e)))
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    /// Create a new account
    async fn create_account(&self, display_name: &str, staff: bool) -> Result<Account> {
        debug!("Creating new account in database");

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO accounts (id, display_name, staff) VALUES ($1, $2, $3)"
        )
        .bind(id)
        .bind(display_name)
        .bind(staff)
        .execute(&self.pool)
        .await?;

        let account = Account {
            id,
            display_name: display_name.to_string(),
            staff,
            created_at: now,
            updated_at: now,
        };

        Ok(account)
    }

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query(
            "SELECT id, display_name, staff, created_at, updated_at FROM accounts WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let account = Account {
                    id: row.get("id"),
                    display_name: row.get("display_name"),
                    staff: row.get("staff"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                };
                Ok(Some(account))
            },
            None => Ok(None),
        }
    }

    /// Get a balance for an account
    async fn get_balance(&self, account_id: Uuid) -> Result<Option<PointsBalance>> {
        debug!("Getting balance from database for {}", account_id);

        let row = sqlx::query(
            "SELECT account_id, total, available, held, updated_at
             FROM balances
             WHERE account_id = $1"
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let total_str: String = row.get("total");
                let available_str: String = row.get("available");
                let held_str: String = row.get("held");

                let balance = PointsBalance {
                    account_id,
                    total: Self::parse_points(&total_str, "total")?,
                    available: Self::parse_points(&available_str, "available")?,
                    held: Self::parse_points(&held_str, "held")?,
                    updated_at: row.get("updated_at"),
                };

                Ok(Some(balance))
            },
            None => Ok(None),
        }
    }

    /// Update a balance
    async fn update_balance(&self, balance: PointsBalance) -> Result<PointsBalance> {
        debug!("Updating balance in database for {}", balance.account_id);

        let result = sqlx::query(
            "INSERT INTO balances (account_id, total, available, held)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (account_id)
             DO UPDATE SET
                total = $2,
                available = $3,
                held = $4"
        )
        .bind(balance.account_id)
        .bind(balance.total.to_string())
        .bind(balance.available.to_string())
        .bind(balance.held.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!("Failed to update balance for account: {}",
                                               balance.account_id)));
        }

        Ok(balance)
    }

    /// Ensure a balance exists, creating it if necessary
    async fn ensure_balance(&self, account_id: Uuid) -> Result<PointsBalance> {
        debug!("Ensuring balance exists for {}", account_id);

        // First check if the account exists
        let account_exists = sqlx::query("SELECT 1 FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        if !account_exists {
            return Err(Error::AccountNotFound(format!("Account not found: {}", account_id)));
        }

        // Then check if the balance exists
        if let Some(balance) = self.get_balance(account_id).await? {
            return Ok(balance);
        }

        // Create a new zero balance
        let balance = PointsBalance::new(account_id);

        sqlx::query(
            "INSERT INTO balances (account_id, total, available, held)
             VALUES ($1, $2, $3, $4)"
        )
        .bind(account_id)
        .bind(balance.total.to_string())
        .bind(balance.available.to_string())
        .bind(balance.held.to_string())
        .execute(&self.pool)
        .await?;

        Ok(balance)
    }
}
