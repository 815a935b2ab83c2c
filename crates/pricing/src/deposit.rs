//! Deposit (partial payment) policies.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::PricingError, money::round_currency};

/// How a purchasable expresses its deposit requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositKind {
    /// `value` is a percentage (in points) of the covered total.
    Percentage,
    /// `value` is a fixed monetary amount.
    Fixed,
}

/// A single purchasable's deposit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPolicy {
    /// Whether this purchasable accepts deposits at all.
    pub allowed: bool,
    /// Interpretation of `value`.
    pub kind: DepositKind,
    /// Percentage points or fixed amount, per `kind`.
    pub value: Decimal,
    /// Floor on the computed minimum.
    pub minimum_amount: Decimal,
}

impl DepositPolicy {
    /// Policy for a purchasable that never accepts deposits.
    #[must_use]
    pub const fn disallowed() -> Self {
        Self {
            allowed: false,
            kind: DepositKind::Fixed,
            value: Decimal::ZERO,
            minimum_amount: Decimal::ZERO,
        }
    }

    /// The minimum deposit this policy demands against the total of the line
    /// items that reference its purchasable.
    #[must_use]
    pub fn minimum_for(&self, covered_total: Decimal) -> Decimal {
        let computed = match self.kind {
            DepositKind::Percentage => {
                round_currency(Percentage::from(self.value / Decimal::ONE_HUNDRED) * covered_total)
            }
            DepositKind::Fixed => self.value,
        };

        computed.max(self.minimum_amount)
    }
}

/// The cart-level fold of per-purchasable deposit policies.
///
/// `allowed` is the logical AND across every referenced purchasable;
/// `minimum_amount` is the sum of each purchasable's own minimum over the
/// lines that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveDepositPolicy {
    /// Whether every purchasable in the cart accepts deposits.
    pub allowed: bool,
    /// Sum of per-purchasable minimums.
    pub minimum_amount: Decimal,
}

impl EffectiveDepositPolicy {
    /// Fold `(policy, covered_total)` pairs into the cart-level policy.
    ///
    /// An empty cart folds to "deposits not allowed": the AND-over-purchasables
    /// rule gives no basis for allowing a deposit nobody opted into.
    #[must_use]
    pub fn fold<'a, I>(policies: I) -> Self
    where
        I: IntoIterator<Item = (&'a DepositPolicy, Decimal)>,
    {
        let mut any = false;
        let mut allowed = true;
        let mut minimum_amount = Decimal::ZERO;

        for (policy, covered_total) in policies {
            any = true;
            allowed &= policy.allowed;
            minimum_amount += policy.minimum_for(covered_total);
        }

        Self {
            allowed: allowed && any,
            minimum_amount,
        }
    }
}

/// Resolve the amount to charge for a requested deposit.
///
/// Over-payment clamps to `final_total` (the effective minimum is likewise
/// capped there: a deposit can never be required to exceed the total). All
/// other invalid input is rejected.
///
/// # Errors
///
/// - [`PricingError::DepositsNotAllowed`] when any purchasable disallows
///   deposits.
/// - [`PricingError::InvalidAmount`] when `requested` is negative.
/// - [`PricingError::DepositBelowMinimum`] when `requested` is below the
///   effective minimum.
pub fn resolve_deposit_amount(
    requested: Decimal,
    policy: &EffectiveDepositPolicy,
    final_total: Decimal,
) -> Result<Decimal, PricingError> {
    if !policy.allowed {
        return Err(PricingError::DepositsNotAllowed);
    }

    if requested < Decimal::ZERO {
        return Err(PricingError::InvalidAmount);
    }

    let minimum = policy.minimum_amount.min(final_total);

    if requested < minimum {
        return Err(PricingError::DepositBelowMinimum { minimum });
    }

    Ok(requested.min(final_total))
}
