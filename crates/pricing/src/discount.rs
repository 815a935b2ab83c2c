//! Discount application.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::PricingError, money::round_currency};

/// A discount attached to a cart after a successful server validation.
///
/// Absence of a `DiscountState` means no discount is applied. The invariant
/// `final_total = subtotal - amount` (never negative) holds by construction:
/// the only way to obtain one is [`discount_state`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountState {
    /// The validated discount code.
    pub code: String,
    /// Discount percentage in points (`10` means 10% off).
    pub percentage: Decimal,
    /// Monetary amount taken off the subtotal.
    pub amount: Decimal,
    /// Subtotal after the discount, floored at zero.
    pub final_total: Decimal,
}

/// Build a [`DiscountState`] for a validated code against a subtotal.
///
/// # Errors
///
/// - [`PricingError::InvalidPercentage`] when `percentage` is outside
///   `[0, 100]`.
/// - [`PricingError::InvalidAmount`] when `subtotal` is negative.
pub fn discount_state(
    code: impl Into<String>,
    percentage: Decimal,
    subtotal: Decimal,
) -> Result<DiscountState, PricingError> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(PricingError::InvalidPercentage);
    }

    if subtotal < Decimal::ZERO {
        return Err(PricingError::InvalidAmount);
    }

    let amount = round_currency(Percentage::from(percentage / Decimal::ONE_HUNDRED) * subtotal);
    let final_total = (subtotal - amount).max(Decimal::ZERO);

    Ok(DiscountState {
        code: code.into(),
        percentage,
        amount,
        final_total,
    })
}

/// Apply an optional discount to a subtotal.
///
/// With no discount the subtotal passes through unchanged, so applying then
/// removing a discount restores the original total exactly.
#[must_use]
pub fn apply_discount(subtotal: Decimal, discount: Option<&DiscountState>) -> Decimal {
    match discount {
        None => subtotal,
        Some(state) => {
            // Round the discount amount, not the difference, so the result
            // agrees with the `amount` a `DiscountState` reports.
            let off =
                round_currency(Percentage::from(state.percentage / Decimal::ONE_HUNDRED) * subtotal);

            (subtotal - off).max(Decimal::ZERO)
        }
    }
}
