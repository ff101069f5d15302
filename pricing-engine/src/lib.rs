//! Pure pricing and validation core shared by every order flow
//!
//! Order creation, offer acceptance, and order modification all price a
//! draft the same way: parse the typed quantity, compute the rounded
//! total, check it against the buyer's balance, and (for modifications)
//! reduce the change to a single signed escrow delta. This crate holds
//! that arithmetic in one place so the three flows cannot drift.
//!
//! Everything here is synchronous and side-effect free; callers invoke it
//! on every form edit.

pub mod calculator;
pub mod delta;
pub mod intent;

pub use calculator::{compute_balance_check, compute_total, exceeds_max, parse_quantity, BalanceCheck};
pub use delta::{compute_delta, ModificationDelta};
pub use intent::{BuildRejection, BuiltIntent, DraftContext, DraftField, OrderDraft, OrderIntent, OrderIntentBuilder};
