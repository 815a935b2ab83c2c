//! Currency precision.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places carried by every monetary result.
pub const CURRENCY_DP: u32 = 2;

/// Round a monetary value to [`CURRENCY_DP`] places, midpoint away from zero.
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}
