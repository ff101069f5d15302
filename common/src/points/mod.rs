//! Decimal type utilities for precise point arithmetic

use rust_decimal::{Decimal, RoundingStrategy};
pub use rust_decimal_macros::dec;

/// Point amount (the platform currency)
pub type Points = Decimal;

/// Quantity of a listing's unit with high precision
pub type Quantity = Decimal;

/// Price in points per unit of a listing
pub type PricePerUnit = Decimal;

/// Rounding helpers for common operations
pub mod rounding {
    use super::*;

    /// Default quantity precision (3 decimal places, e.g. 0.250 kg)
    pub const QUANTITY_PRECISION: u32 = 3;

    /// Round a point amount to the nearest whole point, half-up
    pub fn round_points(amount: Decimal) -> Points {
        amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round a quantity to standard precision
    pub fn round_quantity(qty: Quantity) -> Quantity {
        qty.round_dp(QUANTITY_PRECISION)
    }
}
