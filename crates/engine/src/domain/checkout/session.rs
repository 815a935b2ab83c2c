//! Checkout session model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CheckoutId, OrderId};

/// The orchestrator's position in the checkout workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Cart review, validation and discount application.
    Review,
    /// Billing capture and payment submission.
    Payment,
    /// Terminal display state; partial payments can be settled from here.
    Confirmation,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Review => "review",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        };

        f.write_str(name)
    }
}

/// Settlement status of a submitted checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Submitted but not yet settled.
    Pending,
    /// Fully paid; terminal.
    Completed,
    /// Deposit paid, balance outstanding.
    PartiallyPaid,
    /// Payment failed; terminal.
    Failed,
}

impl PaymentStatus {
    /// Whether the session can change no further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A submitted checkout, as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// The checkout session id obtained from the initiate call.
    pub checkout_id: CheckoutId,
    /// The created order, once one exists.
    pub order_id: Option<OrderId>,
    /// Amount settled so far.
    pub amount_paid: Decimal,
    /// Amount outstanding; zero once completed.
    pub balance_due: Decimal,
    /// Settlement status.
    pub status: PaymentStatus,
}

/// Result of a pay-remaining-balance call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    /// Total amount settled after this payment.
    pub amount_paid: Decimal,
    /// Remaining balance after this payment.
    pub balance_due: Decimal,
    /// Settlement status after this payment.
    pub status: PaymentStatus,
}
