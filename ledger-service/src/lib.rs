//! Ledger service for managing member accounts and point balances

pub mod service;
pub mod repository;
pub mod config;
pub mod effective;

pub use service::LedgerService;
pub use service::RepositoryType;
pub use repository::{LedgerRepository, InMemoryLedgerRepository, PostgresLedgerRepository};
pub use config::LedgerServiceConfig;
pub use effective::EffectivePoints;
