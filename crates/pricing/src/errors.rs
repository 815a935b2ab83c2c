//! Pricing errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by pricing calculations.
///
/// Invalid input is rejected, never clamped: a caller that passes a zero
/// quantity or a negative amount gets an error back, not a silently adjusted
/// figure. The only clamps in this crate are the ones the pricing rules
/// themselves define (discount floor at zero, deposit cap at the total).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Line quantity was below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A base price or fee rate was negative.
    #[error("prices and fee rates must not be negative")]
    InvalidPrice,

    /// A discount percentage was outside `[0, 100]`.
    #[error("discount percentage must be between 0 and 100")]
    InvalidPercentage,

    /// A requested amount was negative.
    #[error("amount must not be negative")]
    InvalidAmount,

    /// A requested deposit was below the effective minimum.
    #[error("deposit is below the minimum of {minimum}")]
    DepositBelowMinimum {
        /// The effective minimum deposit for the cart.
        minimum: Decimal,
    },

    /// At least one purchasable in the cart disallows deposits.
    #[error("deposits are not allowed for this cart")]
    DepositsNotAllowed,
}
