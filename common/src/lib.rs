//! Common types and utilities for the marketplace engine
//!
//! This library contains shared types, utilities, and abstractions used across
//! all services in the marketplace platform. It provides a unified approach to
//! error handling, database access, and domain models.

pub mod error;
pub mod model;
pub mod points;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use points::*;

// Re-export database types
pub use db::transaction::{DBTransaction, TransactionManager};

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
