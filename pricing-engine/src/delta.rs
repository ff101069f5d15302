//! Escrow delta for order modification
//!
//! Changing an order's quantity charges or refunds only the difference
//! between the old and new totals. Charging the full new total and then
//! refunding the old one would expose the buyer to a transient
//! double-debit if the two legs ever ran non-atomically; a single signed
//! delta cannot.

use common::model::order::Order;
use common::points::{Points, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::compute_total;

/// Incremental financial effect of changing an order's quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationDelta {
    /// Rounded total currently held in escrow
    pub old_total: Points,
    /// Rounded total after the proposed change
    pub new_total: Points,
    /// Points that must be newly available; zero when quantity decreases
    pub additional_cost: Points,
    /// Points released back to the buyer; zero when quantity increases
    pub refund_amount: Points,
}

impl ModificationDelta {
    /// Net balance if the modification were applied
    pub fn balance_after(&self, current_balance: Points) -> Points {
        current_balance + (self.old_total - self.new_total)
    }

    /// True when the change has no financial effect
    pub fn is_noop(&self) -> bool {
        self.additional_cost.is_zero() && self.refund_amount.is_zero()
    }
}

/// Compute the escrow delta for a proposed quantity
///
/// Pure and never fails: a proposed quantity of zero yields a full refund
/// of the old total and no additional cost. Totals use the same half-up
/// rounding as order creation so the delta always equals the difference
/// between what is held and what will be held.
pub fn compute_delta(existing: &Order, proposed_quantity: Quantity) -> ModificationDelta {
    let old_total = compute_total(existing.quantity, existing.price_per_unit);
    let new_total = compute_total(proposed_quantity, existing.price_per_unit);

    ModificationDelta {
        old_total,
        new_total,
        additional_cost: (new_total - old_total).max(Decimal::ZERO),
        refund_amount: (old_total - new_total).max(Decimal::ZERO),
    }
}
