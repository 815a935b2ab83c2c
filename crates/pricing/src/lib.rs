//! Turnstile Pricing
//!
//! Pure, deterministic pricing for the Turnstile cart engine: per-line and
//! cart-level totals, discount application, and deposit (partial payment)
//! resolution. No I/O, no clocks, no side effects — every function here maps
//! inputs to a value or an error.

pub mod deposit;
pub mod discount;
pub mod errors;
pub mod line;
pub mod money;
pub mod totals;

pub use deposit::{DepositKind, DepositPolicy, EffectiveDepositPolicy, resolve_deposit_amount};
pub use discount::{DiscountState, apply_discount, discount_state};
pub use errors::PricingError;
pub use line::{PricedLine, line_total};
pub use money::{CURRENCY_DP, round_currency};
pub use totals::cart_subtotal;
