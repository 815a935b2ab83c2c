//! Backend contracts.
//!
//! The logical server interfaces the engine is written against. Wire formats
//! are an implementation choice of the host; the engine only depends on these
//! traits, and the test suites run entirely on their mocks.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use turnstile_pricing::DiscountState;

use crate::{
    domain::{
        carts::models::{CartLineItem, ItemKind},
        checkout::{
            billing::{BillingInfo, PaymentMethod},
            session::{CheckoutSession, PaymentUpdate},
        },
        seats::models::Seat,
    },
    ids::{CheckoutId, GuestCartId, LineItemId, OrderId},
};

/// A backend call that did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The server understood and refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The server could not be reached, or the call timed out. A timeout is
    /// a failure, never a silent success.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Opaque gateway response forwarded with complete-checkout calls.
///
/// The engine never interprets this; it exists so the logical contract of the
/// complete call matches what the backend expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Gateway transaction reference.
    pub reference: String,
    /// Raw gateway payload, passed through untouched.
    pub payload: Value,
}

impl GatewayResponse {
    /// A stub response carrying only a reference.
    #[must_use]
    pub fn stub(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            payload: Value::Null,
        }
    }
}

/// The unified add-item payload for guest carts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestItemSpec {
    /// Purchasable category.
    pub kind: ItemKind,
    /// Identifier of the underlying purchasable.
    pub ref_id: String,
    /// Display title.
    pub title: String,
    /// Unit count.
    pub quantity: u32,
    /// Unit price at add-time.
    pub price: Decimal,
    /// Opaque payload carried through to order creation.
    pub metadata: Value,
}

/// The legacy positional add-item payload: `(ref_id, title, price, quantity)`.
///
/// Kept only as an adapter at the service boundary for callers that predate
/// the unified shape; it is normalized immediately and never travels further.
#[derive(Debug, Clone)]
pub struct LegacyGuestItem(pub String, pub String, pub Decimal, pub u32);

impl From<LegacyGuestItem> for GuestItemSpec {
    fn from(LegacyGuestItem(ref_id, title, price, quantity): LegacyGuestItem) -> Self {
        Self {
            kind: ItemKind::Product,
            ref_id,
            title,
            quantity,
            price,
            metadata: Value::Null,
        }
    }
}

/// Authoritative server snapshot of a guest cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items as the server holds them.
    pub items: Vec<CartLineItem>,
    /// Discount the server has applied, if any.
    pub discount: Option<DiscountState>,
}

/// Order confirmation data returned by a guest checkout.
///
/// Surfaced to the caller so post-purchase account creation can be offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestConfirmation {
    /// Email the order confirmation was sent to.
    pub email: String,
    /// Human-readable confirmation code.
    pub confirmation_code: String,
}

/// Server-held anonymous cart resource.
#[automock]
#[async_trait]
pub trait GuestCartBackend: Send + Sync {
    /// Create a new anonymous cart and return its id.
    async fn create_cart(&self) -> Result<GuestCartId, RemoteError>;

    /// Fetch the authoritative snapshot of a cart.
    async fn get_cart(&self, cart: GuestCartId) -> Result<CartSnapshot, RemoteError>;

    /// Add an item to a cart.
    async fn add_item(&self, cart: GuestCartId, item: GuestItemSpec) -> Result<(), RemoteError>;

    /// Remove an item from a cart.
    async fn remove_item(&self, cart: GuestCartId, item: LineItemId) -> Result<(), RemoteError>;

    /// Delete a cart outright.
    async fn delete_cart(&self, cart: GuestCartId) -> Result<(), RemoteError>;

    /// Submit final billing details for a guest order.
    async fn complete_checkout(
        &self,
        cart: GuestCartId,
        billing: BillingInfo,
    ) -> Result<GuestConfirmation, RemoteError>;
}

/// Authenticated cart and checkout backend.
#[automock]
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// Replace the server cart wholesale with the given lines (sync-to-server).
    async fn replace_cart(&self, items: Vec<CartLineItem>) -> Result<(), RemoteError>;

    /// Validate a discount code against the synced cart.
    async fn apply_discount(&self, code: String) -> Result<DiscountState, RemoteError>;

    /// Remove any applied discount.
    async fn remove_discount(&self) -> Result<(), RemoteError>;

    /// Open a checkout session for the synced cart.
    async fn initiate_checkout(
        &self,
        method: PaymentMethod,
        billing: BillingInfo,
    ) -> Result<CheckoutId, RemoteError>;

    /// Submit the computed amount against an open checkout session.
    async fn complete_checkout(
        &self,
        checkout: CheckoutId,
        method: PaymentMethod,
        amount: Decimal,
        gateway: GatewayResponse,
    ) -> Result<CheckoutSession, RemoteError>;

    /// Settle (part of) the outstanding balance of a partially paid order.
    async fn pay_remaining(
        &self,
        order: OrderId,
        amount: Decimal,
        method: PaymentMethod,
        gateway: GatewayResponse,
    ) -> Result<PaymentUpdate, RemoteError>;
}

/// Per-event seat roster source.
#[automock]
#[async_trait]
pub trait SeatBackend: Send + Sync {
    /// List every seat for an event with its current status.
    async fn list_seats(&self, event_ref: String) -> Result<Vec<Seat>, RemoteError>;
}
