//! Per-line totals.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;

use crate::{errors::PricingError, money::round_currency};

/// The pricing-relevant projection of one cart line.
///
/// The cart engine owns the full line item (metadata, seat references and so
/// on); pricing only ever sees this slice of it. Product lines carry a zero
/// fee rate, which is how the flat-price rule for merchandise falls out
/// without a special case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    /// Source-of-truth unit price before fees, fixed at add-time.
    pub unit_base_price: Decimal,
    /// Category-specific fee fraction (e.g. `0.10`), fixed at add-time.
    pub service_fee_rate: Decimal,
    /// Number of units; seat-backed lines always carry 1.
    pub quantity: u32,
}

impl PricedLine {
    /// Create a priced line.
    #[must_use]
    pub const fn new(unit_base_price: Decimal, service_fee_rate: Decimal, quantity: u32) -> Self {
        Self {
            unit_base_price,
            service_fee_rate,
            quantity,
        }
    }
}

/// Calculate the total for a single line:
/// `(unit_base_price + unit_base_price × service_fee_rate) × quantity`.
///
/// # Errors
///
/// - [`PricingError::InvalidQuantity`] when `quantity < 1`.
/// - [`PricingError::InvalidPrice`] when the base price or fee rate is
///   negative.
pub fn line_total(line: &PricedLine) -> Result<Decimal, PricingError> {
    if line.quantity < 1 {
        return Err(PricingError::InvalidQuantity);
    }

    if line.unit_base_price < Decimal::ZERO || line.service_fee_rate < Decimal::ZERO {
        return Err(PricingError::InvalidPrice);
    }

    let fee = Percentage::from(line.service_fee_rate) * line.unit_base_price;
    let unit = line.unit_base_price + fee;

    Ok(round_currency(unit * Decimal::from(line.quantity)))
}
