//! Cart errors.

use thiserror::Error;

use crate::{backend::RemoteError, store::StoreError};

use super::models::LineItemError;

/// Authenticated cart store errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation requires a signed-in identity and none is present.
    ///
    /// This is a hard precondition: the persisted store key is derived from
    /// the identity, so there is nothing sensible to do without one.
    #[error("not signed in")]
    NotAuthenticated,

    /// No line item with the given id exists in the cart.
    #[error("line item not found")]
    NotFound,

    /// The item (or a patch applied to it) breaks a line invariant.
    #[error(transparent)]
    InvalidItem(#[from] LineItemError),

    /// The persisted cart record could not be encoded or decoded.
    ///
    /// Surfaced rather than silently starting fresh; `clear()` removes the
    /// record and is the recovery path.
    #[error("cart record is unreadable")]
    Codec(#[source] serde_json::Error),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Guest cart service errors.
#[derive(Debug, Error)]
pub enum GuestCartError {
    /// The server rejected the cart-creation request; the caller must retry
    /// or fall back to requiring authentication.
    #[error("guest cart could not be created")]
    CreationFailed(#[source] RemoteError),

    /// No guest cart token is present locally.
    #[error("no active guest cart")]
    NoActiveCart,

    /// A backend call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
