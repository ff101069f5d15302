//! Shared pricing arithmetic
//!
//! Pure functions computing totals, balance checks, and quantity caps.
//! Quantity input arrives as free text from the hosting form and may be
//! anything; unparsable input coerces to zero so downstream display logic
//! can prompt for a quantity instead of failing.

use common::points::{rounding::round_points, Points, PricePerUnit, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of checking a total price against an account's point balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheck {
    /// Balance supplied by the caller
    pub current_balance: Points,
    /// Total price being checked
    pub total_price: Points,
    /// Balance remaining if the total were charged
    pub balance_after: Points,
    /// True when the balance covers the total
    pub is_sufficient: bool,
    /// Points missing when insufficient, zero otherwise
    pub shortfall: Points,
}

/// Parse a free-text quantity, coercing unparsable input to zero
pub fn parse_quantity(input: &str) -> Quantity {
    input.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

/// Compute the total price in whole points, rounding half-up
///
/// Non-positive quantity or price yields zero: callers treat a zero total
/// as "not yet priceable" rather than an error.
pub fn compute_total(quantity: Quantity, price_per_unit: PricePerUnit) -> Points {
    if quantity <= Decimal::ZERO || price_per_unit <= Decimal::ZERO {
        return Points::ZERO;
    }

    round_points(quantity * price_per_unit)
}

/// Check a total price against the current balance
///
/// Never fails; a total of zero is always sufficient.
pub fn compute_balance_check(current_balance: Points, total_price: Points) -> BalanceCheck {
    let balance_after = current_balance - total_price;
    let is_sufficient = balance_after >= Decimal::ZERO;

    BalanceCheck {
        current_balance,
        total_price,
        balance_after,
        is_sufficient,
        shortfall: if is_sufficient { Points::ZERO } else { -balance_after },
    }
}

/// Check a quantity against an optional cap
///
/// A quantity exactly equal to the cap does not exceed it; an undefined
/// cap is never exceeded.
pub fn exceeds_max(quantity: Quantity, max_available: Option<Quantity>) -> bool {
    match max_available {
        Some(max) => quantity > max,
        None => false,
    }
}
