//! Checkout orchestrator.
//!
//! A forward-only workflow `Review → Payment → Confirmation` with one
//! explicit back edge (`Payment → Review`). Every server-validated operation
//! is preceded by a wholesale sync of the local cart to the server: clear and
//! re-add beats diffing a client cart that may have been mutated offline
//! against a server cart that may be stale.

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use tracing::{info, warn};
use turnstile_pricing::{DiscountState, resolve_deposit_amount};

use crate::{
    backend::{CheckoutBackend, GatewayResponse, GuestConfirmation},
    domain::carts::{authenticated::AuthenticatedCartStore, guest::GuestCartService, models::Cart},
    identity::IdentityProvider,
};

use super::{
    billing::{BillingInfo, PaymentMethod, validate_billing},
    errors::CheckoutError,
    session::{CheckoutSession, CheckoutStep, PaymentStatus},
};

/// How much of the effective total to pay now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAmount {
    /// Pay the full effective total.
    Full,
    /// Pay a deposit of the given amount, subject to the cart's effective
    /// deposit policy.
    Deposit(Decimal),
}

/// Which cart lifecycle the checkout is operating on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSource {
    /// The signed-in shopper's client-persisted cart.
    Authenticated,
    /// The anonymous server-held cart addressed by the shared token.
    Guest,
}

/// What a successful payment submission produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// An authenticated checkout session (possibly partially paid).
    Order(CheckoutSession),
    /// A guest order confirmation (email + code).
    Guest(GuestConfirmation),
}

/// The checkout state machine.
///
/// One flow instance serves one checkout attempt; the UI drives it from a
/// single task, so methods take `&mut self` and every suspension point is a
/// backend call. A failed operation leaves the step unchanged, attaches the
/// error message for display, and never clears the cart.
pub struct CheckoutFlow {
    identity: Arc<dyn IdentityProvider>,
    auth_cart: Arc<AuthenticatedCartStore>,
    guest_cart: Arc<GuestCartService>,
    backend: Arc<dyn CheckoutBackend>,
    step: CheckoutStep,
    session: Option<CheckoutSession>,
    method: Option<PaymentMethod>,
    guest_confirmation: Option<GuestConfirmation>,
    last_error: Option<String>,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("step", &self.step)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl CheckoutFlow {
    /// Start a checkout at the Review step.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        auth_cart: Arc<AuthenticatedCartStore>,
        guest_cart: Arc<GuestCartService>,
        backend: Arc<dyn CheckoutBackend>,
    ) -> Self {
        Self {
            identity,
            auth_cart,
            guest_cart,
            backend,
            step: CheckoutStep::Review,
            session: None,
            method: None,
            guest_confirmation: None,
            last_error: None,
        }
    }

    /// The current workflow step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The submitted checkout session, once one exists.
    #[must_use]
    pub const fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    /// Guest confirmation data, for the optional account-creation side flow.
    /// Offered to guests only, never forced, and never blocks Confirmation.
    #[must_use]
    pub const fn guest_confirmation(&self) -> Option<&GuestConfirmation> {
        self.guest_confirmation.as_ref()
    }

    /// Message of the most recent failure, for display alongside the step.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Select the cart this checkout operates on: the authenticated cart when
    /// an identity is present, else the guest cart when a token exists.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::NothingToCheckOut`] when neither exists.
    pub fn source(&self) -> Result<CartSource, CheckoutError> {
        if self.identity.current_identity().is_some() {
            return Ok(CartSource::Authenticated);
        }

        if self.guest_cart.resync_token()?.is_some() {
            return Ok(CartSource::Guest);
        }

        Err(CheckoutError::NothingToCheckOut)
    }

    /// The active cart's current contents.
    ///
    /// For a guest this is the authoritative server snapshot, refreshed so
    /// stale local state never reaches validation or pricing.
    ///
    /// # Errors
    ///
    /// Source selection, cart store and backend failures.
    pub async fn active_cart(&self) -> Result<Cart, CheckoutError> {
        match self.source()? {
            CartSource::Authenticated => Ok(self.auth_cart.cart()?),
            CartSource::Guest => {
                let snapshot = self.guest_cart.fetch().await?;

                Ok(Cart {
                    items: snapshot.items,
                    discount: snapshot.discount,
                })
            }
        }
    }

    /// Validate the active cart for checkout: at least one line, structural
    /// invariants hold, and no line references an already-started event.
    ///
    /// # Errors
    ///
    /// The first violation found, leaving the step unchanged.
    pub async fn validate_cart(&mut self) -> Result<(), CheckoutError> {
        let result = self.validate_cart_inner().await;

        self.record(result)
    }

    async fn validate_cart_inner(&self) -> Result<(), CheckoutError> {
        let cart = self.active_cart().await?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let now = Timestamp::now();

        for item in &cart.items {
            item.validate()?;

            if let Some(starts_at) = item.starts_at {
                if starts_at <= now {
                    return Err(CheckoutError::EventAlreadyStarted {
                        title: item.title.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Replace the server cart wholesale with the local line items.
    ///
    /// Idempotent; runs before every server-validated operation (discount
    /// apply/remove, checkout initiation) so the server always re-validates
    /// against current line items, never stale client state.
    ///
    /// # Errors
    ///
    /// Cart store or backend failures.
    pub async fn sync_to_server(&self) -> Result<(), CheckoutError> {
        let cart = self.auth_cart.cart()?;

        self.backend.replace_cart(cart.items).await?;

        Ok(())
    }

    /// Apply a discount code (Review step, authenticated carts).
    ///
    /// # Errors
    ///
    /// Wrong step, sync failures, or server rejection of the code.
    pub async fn apply_discount_code(
        &mut self,
        code: &str,
    ) -> Result<DiscountState, CheckoutError> {
        let result = self.apply_discount_inner(code).await;

        self.record(result)
    }

    async fn apply_discount_inner(&self, code: &str) -> Result<DiscountState, CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        self.sync_to_server().await?;

        let state = self.backend.apply_discount(code.to_owned()).await?;
        self.auth_cart.set_discount(Some(state.clone()))?;

        info!(code, amount = %state.amount, "discount applied");

        Ok(state)
    }

    /// Remove the applied discount (Review step, authenticated carts).
    ///
    /// # Errors
    ///
    /// Wrong step, sync failures, or backend failure.
    pub async fn remove_discount_code(&mut self) -> Result<(), CheckoutError> {
        let result = self.remove_discount_inner().await;

        self.record(result)
    }

    async fn remove_discount_inner(&self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        self.sync_to_server().await?;

        self.backend.remove_discount().await?;
        self.auth_cart.set_discount(None)?;

        Ok(())
    }

    /// Advance Review → Payment after a successful validation.
    ///
    /// # Errors
    ///
    /// Wrong step, or any validation failure (step unchanged).
    pub async fn proceed_to_payment(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Review)?;
        self.validate_cart().await?;

        self.step = CheckoutStep::Payment;
        self.last_error = None;

        Ok(())
    }

    /// The single allowed back transition: Payment → Review.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] outside the Payment step.
    pub fn back_to_review(&mut self) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;

        self.step = CheckoutStep::Review;

        Ok(())
    }

    /// Submit payment for the active cart (Payment step).
    ///
    /// Authenticated carts go through initiate + complete against the
    /// checkout backend; guest carts go through the guest backend's
    /// complete-checkout, always for the full amount. Success advances to
    /// Confirmation and clears the active cart; failure stays in Payment with
    /// the error attached, and the cart is untouched so the shopper can retry
    /// without re-adding items.
    ///
    /// # Errors
    ///
    /// Billing validation, deposit resolution, or backend failures.
    pub async fn submit_payment(
        &mut self,
        billing: BillingInfo,
        amount: PaymentAmount,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let result = self.submit_payment_inner(billing, amount).await;

        match result {
            Ok(outcome) => {
                self.step = CheckoutStep::Confirmation;
                self.last_error = None;

                Ok(outcome)
            }
            Err(error) => {
                warn!(%error, "payment submission failed");
                self.last_error = Some(error.to_string());

                Err(error)
            }
        }
    }

    async fn submit_payment_inner(
        &mut self,
        billing: BillingInfo,
        amount: PaymentAmount,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        validate_billing(&billing)?;

        match self.source()? {
            CartSource::Authenticated => self.submit_authenticated(billing, amount).await,
            CartSource::Guest => self.submit_guest(billing, amount).await,
        }
    }

    async fn submit_authenticated(
        &mut self,
        billing: BillingInfo,
        amount: PaymentAmount,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let cart = self.auth_cart.cart()?;
        let total = cart.total()?;

        let amount_due = match amount {
            PaymentAmount::Full => total,
            PaymentAmount::Deposit(requested) => {
                let policy = cart.effective_deposit_policy()?;

                resolve_deposit_amount(requested, &policy, total)?
            }
        };

        self.sync_to_server().await?;

        let method = billing.method;
        let checkout_id = self
            .backend
            .initiate_checkout(method, billing)
            .await?;

        let session = self
            .backend
            .complete_checkout(
                checkout_id,
                method,
                amount_due,
                GatewayResponse::stub(checkout_id.to_string()),
            )
            .await?;

        info!(
            checkout = %checkout_id,
            amount = %amount_due,
            status = ?session.status,
            "checkout completed"
        );

        self.auth_cart.clear()?;
        self.method = Some(method);
        self.session = Some(session.clone());

        Ok(CheckoutOutcome::Order(session))
    }

    async fn submit_guest(
        &mut self,
        billing: BillingInfo,
        amount: PaymentAmount,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // Guest checkout settles in full; deposits need an account.
        if matches!(amount, PaymentAmount::Deposit(_)) {
            return Err(CheckoutError::GuestDepositsUnsupported);
        }

        let confirmation = self.guest_cart.complete_checkout(billing).await?;

        self.guest_confirmation = Some(confirmation.clone());

        Ok(CheckoutOutcome::Guest(confirmation))
    }

    /// Settle outstanding balance from Confirmation (partial payments only).
    ///
    /// The amount is clamped to `[0, balance_due]`; a non-positive request is
    /// rejected with [`CheckoutError::InvalidAmount`]. This is the explicit,
    /// user-initiated follow-up for incomplete payment — there is no
    /// automatic retry.
    ///
    /// # Errors
    ///
    /// Wrong step, missing or already-settled session, invalid amount, or
    /// backend failure.
    pub async fn pay_remaining(&mut self, requested: Decimal) -> Result<CheckoutSession, CheckoutError> {
        let result = self.pay_remaining_inner(requested).await;

        self.record(result)
    }

    async fn pay_remaining_inner(
        &mut self,
        requested: Decimal,
    ) -> Result<CheckoutSession, CheckoutError> {
        self.expect_step(CheckoutStep::Confirmation)?;

        let (order_id, balance_due) = match &self.session {
            None => return Err(CheckoutError::NoSession),
            Some(session) if session.status != PaymentStatus::PartiallyPaid => {
                return Err(CheckoutError::AlreadySettled);
            }
            Some(session) => (
                session.order_id.ok_or(CheckoutError::NoSession)?,
                session.balance_due,
            ),
        };

        if requested <= Decimal::ZERO {
            return Err(CheckoutError::InvalidAmount);
        }

        let method = self.method.ok_or(CheckoutError::NoSession)?;
        let amount = requested.min(balance_due);

        let update = self
            .backend
            .pay_remaining(
                order_id,
                amount,
                method,
                GatewayResponse::stub(order_id.to_string()),
            )
            .await?;

        info!(order = %order_id, amount = %amount, status = ?update.status, "balance payment");

        let session = match &mut self.session {
            Some(session) => {
                session.amount_paid = update.amount_paid;
                session.balance_due = update.balance_due;
                session.status = update.status;
                session.clone()
            }
            // Guarded above; the session cannot disappear mid-call.
            None => return Err(CheckoutError::NoSession),
        };

        Ok(session)
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn record<T>(&mut self, result: Result<T, CheckoutError>) -> Result<T, CheckoutError> {
        match result {
            Ok(value) => {
                self.last_error = None;

                Ok(value)
            }
            Err(error) => {
                self.last_error = Some(error.to_string());

                Err(error)
            }
        }
    }
}
