//! Cart lifecycles.
//!
//! Two lifecycles with no implicit migration between them: the authenticated
//! cart lives client-side keyed by identity, the guest cart lives server-side
//! addressed by a shared token.

pub mod authenticated;
pub mod errors;
pub mod guest;
pub mod models;

pub use authenticated::AuthenticatedCartStore;
pub use errors::{CartError, GuestCartError};
pub use guest::GuestCartService;
pub use models::{Cart, CartLineItem, ItemKind, LineItemError, LineItemPatch, NewLineItem, SeatRef};
