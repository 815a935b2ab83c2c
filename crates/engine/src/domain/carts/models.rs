//! Cart models.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use thiserror::Error;
use turnstile_pricing::{
    DepositPolicy, DiscountState, EffectiveDepositPolicy, PricedLine, PricingError,
    apply_discount, cart_subtotal,
};

use crate::ids::LineItemId;

/// Seat identifier/label as the seat backend reports it (e.g. `"A-12"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatRef(String);

impl SeatRef {
    /// Wrap a seat label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The raw label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// The purchasable category a line item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// General-admission event ticket.
    EventTicket,
    /// A reserved seat at an event; one line item per seat.
    Seat,
    /// A reserved seat on a bus departure; one line item per seat.
    BusSeat,
    /// A flight offer booked for a group of passengers.
    FlightPassengerGroup,
    /// Merchandise; flat price, no service fee.
    Product,
}

impl ItemKind {
    /// The category's service fee fraction, fixed onto the line at add-time.
    #[must_use]
    pub fn default_fee_rate(self) -> Decimal {
        match self {
            Self::EventTicket | Self::Seat => Decimal::new(10, 2),
            Self::BusSeat => Decimal::new(5, 2),
            Self::FlightPassengerGroup | Self::Product => Decimal::ZERO,
        }
    }

    /// Whether lines of this kind are bound to concrete seats.
    #[must_use]
    pub const fn is_seat_backed(self) -> bool {
        matches!(self, Self::Seat | Self::BusSeat)
    }
}

/// Line item validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineItemError {
    /// Quantity was below one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// A seat-backed line must carry exactly one seat reference per unit.
    #[error("seat-backed line has {seats} seat reference(s) for quantity {quantity}")]
    SeatCountMismatch {
        /// Seat references on the line.
        seats: usize,
        /// Units on the line.
        quantity: u32,
    },
}

/// One purchasable unit in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Client-generated until synced; server-assigned afterwards.
    pub id: LineItemId,
    /// Purchasable category.
    pub kind: ItemKind,
    /// Identifier of the underlying purchasable (event, bus, offer, product).
    pub ref_id: String,
    /// Display title carried for receipts and server sync.
    pub title: String,
    /// Positive unit count; seat-backed lines always carry 1.
    pub quantity: u32,
    /// Source-of-truth unit price before fees, resolved from the tier active
    /// when the item was added and not revalidated until checkout.
    pub unit_base_price: Decimal,
    /// Category fee fraction, fixed at add-time.
    pub service_fee_rate: Decimal,
    /// Seats bound to this line, when seat-backed.
    pub seat_refs: SmallVec<[SeatRef; 2]>,
    /// When the underlying event starts; checkout rejects started events.
    pub starts_at: Option<Timestamp>,
    /// The purchasable's deposit policy, captured at add-time.
    pub deposit_policy: Option<DepositPolicy>,
    /// Opaque payload (passenger details, booking attributes) carried through
    /// to order creation and never interpreted by the cart engine.
    pub metadata: Value,
}

impl CartLineItem {
    /// Check the structural invariants of one line.
    ///
    /// # Errors
    ///
    /// - [`LineItemError::InvalidQuantity`] when `quantity < 1`.
    /// - [`LineItemError::SeatCountMismatch`] when a seat-backed line does not
    ///   carry one seat reference per unit.
    pub fn validate(&self) -> Result<(), LineItemError> {
        if self.quantity < 1 {
            return Err(LineItemError::InvalidQuantity);
        }

        if self.kind.is_seat_backed() && self.seat_refs.len() != self.quantity as usize {
            return Err(LineItemError::SeatCountMismatch {
                seats: self.seat_refs.len(),
                quantity: self.quantity,
            });
        }

        Ok(())
    }

    /// The pricing-relevant projection of this line.
    #[must_use]
    pub const fn priced(&self) -> PricedLine {
        PricedLine::new(self.unit_base_price, self.service_fee_rate, self.quantity)
    }
}

/// Data for a line item about to be added to a cart.
///
/// Constructors encode the per-category branching rules: each variant
/// populates the right fee rate, seat bindings, start time and metadata.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    kind: ItemKind,
    ref_id: String,
    title: String,
    quantity: u32,
    unit_base_price: Decimal,
    service_fee_rate: Decimal,
    seat_refs: SmallVec<[SeatRef; 2]>,
    starts_at: Option<Timestamp>,
    deposit_policy: Option<DepositPolicy>,
    metadata: Value,
}

impl NewLineItem {
    fn base(kind: ItemKind, ref_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            ref_id: ref_id.into(),
            title: title.into(),
            quantity: 1,
            unit_base_price: Decimal::ZERO,
            service_fee_rate: kind.default_fee_rate(),
            seat_refs: SmallVec::new(),
            starts_at: None,
            deposit_policy: None,
            metadata: Value::Null,
        }
    }

    /// A general-admission event ticket line.
    pub fn event_ticket(
        event_ref: impl Into<String>,
        title: impl Into<String>,
        unit_base_price: Decimal,
        quantity: u32,
    ) -> Self {
        let mut item = Self::base(ItemKind::EventTicket, event_ref, title);
        item.unit_base_price = unit_base_price;
        item.quantity = quantity;
        item
    }

    /// One reserved seat at an event; `tier_price` is the tier active at
    /// add-time.
    pub fn seat(
        event_ref: impl Into<String>,
        title: impl Into<String>,
        tier_price: Decimal,
        seat: SeatRef,
    ) -> Self {
        let mut item = Self::base(ItemKind::Seat, event_ref, title);
        item.unit_base_price = tier_price;
        item.seat_refs.push(seat);
        item
    }

    /// One reserved seat on a bus departure.
    pub fn bus_seat(
        bus_ref: impl Into<String>,
        title: impl Into<String>,
        unit_base_price: Decimal,
        seat: SeatRef,
    ) -> Self {
        let mut item = Self::base(ItemKind::BusSeat, bus_ref, title);
        item.unit_base_price = unit_base_price;
        item.seat_refs.push(seat);
        item
    }

    /// A flight offer for a passenger group; passenger details travel in the
    /// opaque metadata.
    pub fn flight_passenger_group(
        offer_ref: impl Into<String>,
        title: impl Into<String>,
        group_price: Decimal,
        passengers: Value,
    ) -> Self {
        let mut item = Self::base(ItemKind::FlightPassengerGroup, offer_ref, title);
        item.unit_base_price = group_price;
        item.metadata = passengers;
        item
    }

    /// A merchandise line; flat price, no fee.
    pub fn product(
        product_ref: impl Into<String>,
        title: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        let mut item = Self::base(ItemKind::Product, product_ref, title);
        item.unit_base_price = unit_price;
        item.quantity = quantity;
        item
    }

    /// Attach the event start time (checkout rejects started events).
    #[must_use]
    pub fn with_start(mut self, starts_at: Timestamp) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Capture the purchasable's deposit policy.
    #[must_use]
    pub fn with_deposit_policy(mut self, policy: DepositPolicy) -> Self {
        self.deposit_policy = Some(policy);
        self
    }

    /// Attach opaque booking metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Materialize the line with a fresh client-generated id.
    #[must_use]
    pub fn into_item(self) -> CartLineItem {
        CartLineItem {
            id: LineItemId::generate(),
            kind: self.kind,
            ref_id: self.ref_id,
            title: self.title,
            quantity: self.quantity,
            unit_base_price: self.unit_base_price,
            service_fee_rate: self.service_fee_rate,
            seat_refs: self.seat_refs,
            starts_at: self.starts_at,
            deposit_policy: self.deposit_policy,
            metadata: self.metadata,
        }
    }
}

/// A partial update to an existing line item.
#[derive(Debug, Clone, Default)]
pub struct LineItemPatch {
    /// Replacement quantity.
    pub quantity: Option<u32>,
    /// Replacement seat bindings.
    pub seat_refs: Option<SmallVec<[SeatRef; 2]>>,
    /// Replacement metadata payload.
    pub metadata: Option<Value>,
}

impl LineItemPatch {
    /// Apply this patch to a line, returning the patched copy.
    #[must_use]
    pub fn apply(&self, item: &CartLineItem) -> CartLineItem {
        let mut patched = item.clone();

        if let Some(quantity) = self.quantity {
            patched.quantity = quantity;
        }
        if let Some(seat_refs) = &self.seat_refs {
            patched.seat_refs = seat_refs.clone();
        }
        if let Some(metadata) = &self.metadata {
            patched.metadata = metadata.clone();
        }

        patched
    }
}

/// Ordered collection of line items plus an optional applied discount.
///
/// Both cart lifecycles (authenticated and guest) share this shape; totals
/// are always recomputed through the pricing crate rather than cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Line items in insertion order.
    pub items: Vec<CartLineItem>,
    /// Discount attached after a successful validation call, if any.
    pub discount: Option<DiscountState>,
}

impl Cart {
    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line totals before any discount.
    ///
    /// # Errors
    ///
    /// Propagates pricing failures for invalid lines.
    pub fn subtotal(&self) -> Result<Decimal, PricingError> {
        let lines: Vec<PricedLine> = self.items.iter().map(CartLineItem::priced).collect();

        cart_subtotal(&lines)
    }

    /// Subtotal with the applied discount, if any.
    ///
    /// # Errors
    ///
    /// Propagates pricing failures for invalid lines.
    pub fn total(&self) -> Result<Decimal, PricingError> {
        Ok(apply_discount(self.subtotal()?, self.discount.as_ref()))
    }

    /// Fold the per-purchasable deposit policies of this cart.
    ///
    /// Lines referencing the same purchasable share its policy and pool their
    /// covered total; a line without a captured policy counts as a
    /// purchasable that disallows deposits.
    ///
    /// # Errors
    ///
    /// Propagates pricing failures for invalid lines.
    pub fn effective_deposit_policy(&self) -> Result<EffectiveDepositPolicy, PricingError> {
        let disallowed = DepositPolicy::disallowed();
        let mut by_ref: FxHashMap<&str, (&DepositPolicy, Decimal)> = FxHashMap::default();

        for item in &self.items {
            let total = turnstile_pricing::line_total(&item.priced())?;
            let policy = item.deposit_policy.as_ref().unwrap_or(&disallowed);
            let entry = by_ref
                .entry(item.ref_id.as_str())
                .or_insert((policy, Decimal::ZERO));

            entry.1 += total;
        }

        Ok(EffectiveDepositPolicy::fold(by_ref.into_values()))
    }
}
