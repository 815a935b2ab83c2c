//! Checkout workflow.

pub mod billing;
pub mod errors;
pub mod orchestrator;
pub mod session;

pub use billing::{BillingInfo, BillingValidationError, CardDetails, PaymentMethod};
pub use errors::CheckoutError;
pub use orchestrator::{CartSource, CheckoutFlow, CheckoutOutcome, PaymentAmount};
pub use session::{CheckoutSession, CheckoutStep, PaymentStatus, PaymentUpdate};
