//! Order service: the order and offer submission procedures
//!
//! Every submission validates its draft through the pricing engine,
//! rejects self-dealing, and moves points through ledger escrow before a
//! record is written, so the three flows (place, accept, modify) can
//! never disagree about the arithmetic.

pub mod repository;
pub mod service;

pub use repository::{OrderRepository, InMemoryOrderRepository, PostgresOrderRepository};
pub use service::OrderService;
