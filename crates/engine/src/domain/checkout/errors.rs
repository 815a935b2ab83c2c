//! Checkout errors.

use thiserror::Error;
use turnstile_pricing::PricingError;

use crate::{
    backend::RemoteError,
    domain::carts::{
        errors::{CartError, GuestCartError},
        models::LineItemError,
    },
};

use super::{billing::BillingValidationError, session::CheckoutStep};

/// Errors surfaced by the checkout orchestrator.
///
/// A failed step never advances the state machine and never clears the cart;
/// the caller can correct the problem and retry the same step. Nothing here
/// is retried automatically — checkout is a financial operation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The operation belongs to a different step of the workflow.
    #[error("operation belongs to the {expected} step (currently at {actual})")]
    WrongStep {
        /// Step the operation is valid in.
        expected: CheckoutStep,
        /// Step the orchestrator is actually in.
        actual: CheckoutStep,
    },

    /// Neither an authenticated cart nor a guest token exists; checkout is
    /// unreachable and the host should send the shopper back to the catalog.
    #[error("no cart to check out")]
    NothingToCheckOut,

    /// The active cart holds no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A line item fails its structural invariants.
    #[error(transparent)]
    InvalidItem(#[from] LineItemError),

    /// A line references an event that has already started.
    #[error("event for \"{title}\" has already started")]
    EventAlreadyStarted {
        /// Title of the offending line.
        title: String,
    },

    /// Billing details failed validation.
    #[error(transparent)]
    Billing(#[from] BillingValidationError),

    /// Pricing rejected the cart or the requested amount.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A guest asked to pay a deposit; guest checkout settles in full.
    #[error("deposits require a signed-in account")]
    GuestDepositsUnsupported,

    /// The authenticated cart store failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The guest cart service failed.
    #[error(transparent)]
    Guest(#[from] GuestCartError),

    /// A checkout backend call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A pay-remaining amount was not positive.
    #[error("payment amount must be positive")]
    InvalidAmount,

    /// No checkout session exists to act on.
    #[error("no checkout session")]
    NoSession,

    /// The session is already settled; there is no balance to pay.
    #[error("order is already settled")]
    AlreadySettled,
}
