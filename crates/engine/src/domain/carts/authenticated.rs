//! Authenticated cart store.
//!
//! One cart per signed-in identity, persisted to the client-local store under
//! an identity-derived key. Every mutation rewrites the whole persisted
//! record and recomputes totals; deliberately simple over incremental, so the
//! persisted record can never drift from the in-memory cart.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{
    identity::{IdentityProvider, UserId},
    ids::LineItemId,
    store::{LocalStore, StoreError, cart_key},
};

use super::{
    errors::CartError,
    models::{Cart, CartLineItem, LineItemPatch, NewLineItem},
};

/// Client-side store for the signed-in shopper's cart.
///
/// Carts are never shared across identities: an identity switch (including
/// sign-out) swaps the entire cached cart instance for the new identity's
/// persisted record, it never merges.
pub struct AuthenticatedCartStore {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn LocalStore>,
    cached: Mutex<Option<(UserId, Cart)>>,
}

impl std::fmt::Debug for AuthenticatedCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedCartStore").finish_non_exhaustive()
    }
}

impl AuthenticatedCartStore {
    /// Create a store over the given identity source and persistence.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            identity,
            store,
            cached: Mutex::new(None),
        }
    }

    /// The signed-in shopper's cart, loaded from the persisted record when
    /// the cached instance belongs to a different identity.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotAuthenticated`] when nobody is signed in.
    /// - [`CartError::Codec`] when the persisted record is unreadable.
    /// - [`CartError::Store`] when the local store fails.
    pub fn cart(&self) -> Result<Cart, CartError> {
        let user = self.current_user()?;
        let mut cached = self.lock_cache()?;

        Ok(self.cart_for(&mut cached, &user)?.clone())
    }

    /// Add a line item. Hard precondition: an identity must be present.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotAuthenticated`] when nobody is signed in.
    /// - [`CartError::InvalidItem`] when the item breaks a line invariant.
    /// - [`CartError::Codec`] / [`CartError::Store`] on persistence failure.
    pub fn add_item(&self, new: NewLineItem) -> Result<CartLineItem, CartError> {
        let item = new.into_item();
        item.validate()?;

        self.mutate(|cart| {
            cart.items.push(item.clone());
            Ok(item.clone())
        })
    }

    /// Remove a line item by id.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotFound`] when no line carries the id.
    /// - Other variants as for [`Self::add_item`].
    pub fn remove_item(&self, id: LineItemId) -> Result<(), CartError> {
        self.mutate(|cart| {
            let index = cart
                .items
                .iter()
                .position(|item| item.id == id)
                .ok_or(CartError::NotFound)?;

            cart.items.remove(index);

            Ok(())
        })
    }

    /// Apply a partial update to a line item.
    ///
    /// The patch is validated against the line invariants before anything is
    /// committed; a rejected patch leaves the cart untouched.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotFound`] when no line carries the id.
    /// - [`CartError::InvalidItem`] when the patched line would be invalid.
    /// - Other variants as for [`Self::add_item`].
    pub fn update_item(
        &self,
        id: LineItemId,
        patch: &LineItemPatch,
    ) -> Result<CartLineItem, CartError> {
        self.mutate(|cart| {
            let slot = cart
                .items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or(CartError::NotFound)?;

            let patched = patch.apply(slot);
            patched.validate()?;

            *slot = patched.clone();

            Ok(patched)
        })
    }

    /// Attach or detach the applied discount.
    ///
    /// # Errors
    ///
    /// As for [`Self::add_item`], minus item validation.
    pub fn set_discount(
        &self,
        discount: Option<turnstile_pricing::DiscountState>,
    ) -> Result<(), CartError> {
        self.mutate(|cart| {
            cart.discount = discount.clone();
            Ok(())
        })
    }

    /// Empty the cart and remove the persisted record entirely.
    ///
    /// Removal (rather than writing an empty record) keeps the store free of
    /// stale keys; a subsequent fresh load sees an empty cart.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotAuthenticated`] when nobody is signed in.
    /// - [`CartError::Store`] when the local store fails.
    pub fn clear(&self) -> Result<(), CartError> {
        let user = self.current_user()?;

        self.store.remove(&cart_key(&user))?;

        let mut cached = self.lock_cache()?;
        *cached = Some((user, Cart::default()));

        Ok(())
    }

    fn current_user(&self) -> Result<UserId, CartError> {
        self.identity
            .current_identity()
            .map(|identity| identity.id)
            .ok_or(CartError::NotAuthenticated)
    }

    fn lock_cache(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<(UserId, Cart)>>, CartError> {
        self.cached
            .lock()
            .map_err(|e| CartError::Store(StoreError::Backend(e.to_string())))
    }

    /// Fetch the cached cart for `user`, loading from the persisted record on
    /// an identity change.
    fn cart_for<'a>(
        &self,
        cached: &'a mut Option<(UserId, Cart)>,
        user: &UserId,
    ) -> Result<&'a mut Cart, CartError> {
        let stale = !matches!(cached, Some((cached_user, _)) if cached_user == user);

        if stale {
            let cart = self.load(user)?;
            *cached = Some((user.clone(), cart));
        }

        match cached {
            Some((_, cart)) => Ok(cart),
            // Unreachable: the branch above always fills the slot.
            None => Err(CartError::NotAuthenticated),
        }
    }

    fn load(&self, user: &UserId) -> Result<Cart, CartError> {
        match self.store.get(&cart_key(user))? {
            None => Ok(Cart::default()),
            Some(raw) => serde_json::from_str(&raw).map_err(CartError::Codec),
        }
    }

    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Cart) -> Result<R, CartError>,
    ) -> Result<R, CartError> {
        let user = self.current_user()?;
        let mut cached = self.lock_cache()?;
        let cart = self.cart_for(&mut cached, &user)?;

        let result = op(cart)?;

        // Full rewrite on every mutation, then recompute totals for the log.
        let raw = serde_json::to_string(cart).map_err(CartError::Codec)?;
        self.store.put(&cart_key(&user), &raw)?;

        if let (Ok(subtotal), Ok(total)) = (cart.subtotal(), cart.total()) {
            debug!(user = %user, items = cart.items.len(), %subtotal, %total, "cart persisted");
        }

        Ok(result)
    }
}
