//! Client-local persisted key/value store.
//!
//! The engine persists the authenticated cart (one record per identity) and
//! the shared guest-cart token here. The store is observable: every write
//! fans out a [`StoreEvent`] so another tab's change to the guest token can
//! be picked up without polling.

mod memory;

pub use memory::MemoryStore;

use thiserror::Error;
use tokio::sync::broadcast;

/// Well-known key holding the shared guest-cart token.
pub const GUEST_TOKEN_KEY: &str = "guest_cart_token";

/// Key under which an identity's cart record is persisted.
#[must_use]
pub fn cart_key(user: &crate::identity::UserId) -> String {
    format!("cart:{user}")
}

/// A change observed in the store. `value` is `None` for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    /// The key that changed.
    pub key: String,
    /// The new value, or `None` when the key was removed.
    pub value: Option<String>,
}

/// Errors from the persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage rejected or failed the operation.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Observable key/value persistence, in the shape of browser local storage.
///
/// Reads and writes are synchronous from the caller's perspective: a caller's
/// next `get` sees its own `put`. Values are opaque strings; the engine
/// serializes records to JSON before writing.
pub trait LocalStore: Send + Sync {
    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the backend fails.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the backend fails.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key entirely (not just empty it).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the backend fails.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Subscribe to change notifications for every key.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
