//! Cart-level totals.

use rust_decimal::Decimal;

use crate::{
    errors::PricingError,
    line::{PricedLine, line_total},
};

/// Sum the line totals of every line in a cart.
///
/// An empty cart has a subtotal of zero; whether an empty cart may proceed to
/// checkout is the orchestrator's call, not a pricing concern.
///
/// # Errors
///
/// Propagates the first [`line_total`] failure, so a single invalid line
/// poisons the whole subtotal rather than being skipped.
pub fn cart_subtotal<'a, I>(lines: I) -> Result<Decimal, PricingError>
where
    I: IntoIterator<Item = &'a PricedLine>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, line| Ok(acc + line_total(line)?))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn subtotal_equals_sum_of_independent_line_totals() -> TestResult {
        let lines = [
            PricedLine::new(Decimal::from(1000), "0.10".parse()?, 2),
            PricedLine::new(Decimal::from(500), "0.05".parse()?, 1),
            PricedLine::new(Decimal::from(250), Decimal::ZERO, 4),
        ];

        let independent: Decimal = lines
            .iter()
            .map(line_total)
            .sum::<Result<Decimal, PricingError>>()?;

        assert_eq!(cart_subtotal(&lines)?, independent);
        assert_eq!(independent, Decimal::from(2200 + 525 + 1000));

        Ok(())
    }

    #[test]
    fn empty_cart_has_zero_subtotal() -> TestResult {
        let lines: [PricedLine; 0] = [];

        assert_eq!(cart_subtotal(&lines)?, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn invalid_line_poisons_the_subtotal() -> TestResult {
        let lines = [
            PricedLine::new(Decimal::from(1000), "0.10".parse()?, 2),
            PricedLine::new(Decimal::from(1000), Decimal::ZERO, 0),
        ];

        assert_eq!(cart_subtotal(&lines), Err(PricingError::InvalidQuantity));

        Ok(())
    }
}
