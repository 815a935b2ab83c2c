//! Turnstile engine: cart and checkout orchestration for multi-vertical
//! commerce (event tickets, reserved seats, bus seats, flight bookings,
//! merchandise).
//!
//! The engine is transport-agnostic: servers are reached only through the
//! traits in [`backend`], local persistence only through [`store::LocalStore`],
//! and the signed-in identity only through [`identity::IdentityProvider`].
//! Hosts supply implementations of those seams; the test suites run on mocks.
//!
//! Monetary amounts are [`rust_decimal::Decimal`] throughout, with all
//! pricing arithmetic delegated to the `turnstile-pricing` crate.

pub mod backend;
pub mod config;
pub mod domain;
pub mod identity;
pub mod ids;
pub mod store;
