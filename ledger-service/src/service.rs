//! Ledger service implementation

use std::sync::Arc;

use common::error::{Error, Result, ErrorExt};
use common::model::account::{Account, PointsBalance};
use common::points::Points;
use pricing_engine::ModificationDelta;
use rust_decimal::Decimal;
use tracing::{debug, info, error};
use uuid::Uuid;

use crate::repository::{LedgerRepository, InMemoryLedgerRepository, PostgresLedgerRepository};

/// Ledger service for managing member accounts and point balances
pub struct LedgerService {
    /// Repository for account data
    repo: Arc<dyn LedgerRepository>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl LedgerService {
    /// Create a new ledger service
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryLedgerRepository::new()),
        }
    }

    /// Create a new ledger service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn LedgerRepository> = match repo_type {
            RepositoryType::InMemory => {
                Arc::new(InMemoryLedgerRepository::new())
            },
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresLedgerRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new ledger service with a configuration
    pub async fn with_config(config: &crate::config::LedgerServiceConfig) -> Result<Self> {
        let repo: Arc<dyn LedgerRepository> = Arc::new(
            PostgresLedgerRepository::with_config(config).await?
        );

        Ok(Self { repo })
    }

    /// Create a new member account
    pub async fn create_account(&self, display_name: &str) -> Result<Account> {
        info!("Creating new account for {}", display_name);
        self.repo.create_account(display_name, false).await
    }

    /// Create a new staff account
    pub async fn create_staff_account(&self, display_name: &str) -> Result<Account> {
        info!("Creating new staff account for {}", display_name);
        self.repo.create_account(display_name, true).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.repo.get_account(id).await
    }

    /// Get an account's balance
    pub async fn get_balance(&self, account_id: Uuid) -> Result<Option<PointsBalance>> {
        self.repo.get_balance(account_id).await
    }

    /// Grant purchased points to an account (the top-up flow)
    pub async fn top_up(&self, account_id: Uuid, amount: Points) -> Result<PointsBalance> {
        info!("Topping up {} points for account {}", amount, account_id);

        if amount <= Decimal::ZERO {
            return Err(Error::ValidationError(format!("Top-up amount must be positive, got {}", amount)));
        }

        // Ensure the account exists
        let _account = self.repo.get_account(account_id).await
            .with_context(|| format!("Failed to retrieve account {}", account_id))?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        // Get or create balance
        let mut balance = self.repo.ensure_balance(account_id).await
            .with_context(|| format!("Failed to ensure balance for account {}", account_id))?;

        // Update balance
        balance.grant(amount);

        // Save and return
        self.repo.update_balance(balance).await
            .with_context(|| format!("Failed to update balance after top-up for account {}", account_id))
    }

    /// Hold points in escrow for a new order
    pub async fn hold(&self, account_id: Uuid, amount: Points) -> Result<PointsBalance> {
        debug!("Holding {} points for account {}", amount, account_id);

        let mut balance = self.repo.get_balance(account_id).await
            .with_context(|| format!("Failed to retrieve balance for account {}", account_id))?
            .ok_or_else(|| Error::InsufficientPoints(format!("No balance found for account {}", account_id)))?;

        balance.hold(amount).map_err(|e| {
            Error::InsufficientPoints(format!("Cannot hold {} points: {}", amount, e))
        })?;

        self.repo.update_balance(balance).await
            .with_context(|| format!("Failed to update balance after hold for account {}", account_id))
    }

    /// Release held points back to an account (order cancellation)
    pub async fn release(&self, account_id: Uuid, amount: Points) -> Result<PointsBalance> {
        debug!("Releasing {} held points for account {}", amount, account_id);

        let mut balance = self.repo.get_balance(account_id).await?
            .ok_or_else(|| Error::Internal(format!("No balance found for account {}", account_id)))?;

        balance.release(amount);

        self.repo.update_balance(balance).await
            .with_context(|| format!("Failed to update balance after release for account {}", account_id))
    }

    /// Apply an order-modification escrow delta
    ///
    /// Exactly the delta is moved: an additional cost shifts available
    /// points into escrow, a refund shifts held points back. The full new
    /// total is never re-charged.
    pub async fn apply_delta(&self, account_id: Uuid, delta: &ModificationDelta) -> Result<PointsBalance> {
        debug!(
            "Applying escrow delta for account {}: +{} / -{}",
            account_id, delta.additional_cost, delta.refund_amount
        );

        let mut balance = self.repo.get_balance(account_id).await?
            .ok_or_else(|| Error::Internal(format!("No balance found for account {}", account_id)))?;

        if delta.additional_cost > Decimal::ZERO {
            balance.hold(delta.additional_cost).map_err(|e| {
                Error::InsufficientPoints(format!("Cannot hold {} additional points: {}", delta.additional_cost, e))
            })?;
        } else if delta.refund_amount > Decimal::ZERO {
            balance.release(delta.refund_amount);
        }

        self.repo.update_balance(balance).await
            .with_context(|| format!("Failed to update balance after delta for account {}", account_id))
    }

    /// Settle a completed order, moving held points from buyer to seller
    /// within a database transaction
    pub async fn settle(&self, buyer_id: Uuid, seller_id: Uuid, amount: Points) -> Result<()> {
        debug!("Settling {} points from {} to {}", amount, buyer_id, seller_id);

        // Start a database transaction
        let transaction = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for settlement of {} points", amount))?;

        // Use a closure for the transaction work to handle errors consistently
        let transaction_result = async {
            let buyer_balance_result = self.repo.get_balance(buyer_id).await
                .with_context(|| format!("Failed to get buyer balance for {}", buyer_id))?;

            let seller_balance_result = self.repo.get_balance(seller_id).await
                .with_context(|| format!("Failed to get seller balance for {}", seller_id))?;

            let mut buyer_balance = buyer_balance_result
                .ok_or_else(|| Error::InsufficientPoints(
                    format!("No balance found for buyer {}", buyer_id)
                ))?;

            let mut seller_balance = match seller_balance_result {
                Some(balance) => balance,
                None => self.repo.ensure_balance(seller_id).await
                    .with_context(|| "Failed to create balance for seller")?,
            };

            // Validate held funds
            if buyer_balance.held < amount {
                return Err(Error::InsufficientPoints(format!(
                    "Buyer has insufficient held points: {} < {}", buyer_balance.held, amount
                )));
            }

            // Move the points
            buyer_balance.debit_held(amount).map_err(Error::InsufficientPoints)?;
            seller_balance.credit(amount);

            self.repo.update_balance(buyer_balance).await
                .with_context(|| "Failed to update buyer balance")?;

            self.repo.update_balance(seller_balance).await
                .with_context(|| "Failed to update seller balance")?;

            Ok(())
        }.await;

        // Handle transaction result
        match transaction_result {
            Ok(_) => {
                transaction.commit().await
                    .with_context(|| "Failed to commit settlement transaction")?;

                info!("Settled {} points from {} to {}", amount, buyer_id, seller_id);
                Ok(())
            },
            Err(e) => {
                error!("Error settling {} points from {} to {}: {}", amount, buyer_id, seller_id, e);

                if let Err(rollback_err) = transaction.rollback().await {
                    // Log rollback failure but return the original error
                    error!("Failed to roll back transaction: {}", rollback_err);
                }

                Err(e)
            }
        }
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
