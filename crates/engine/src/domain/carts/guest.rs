//! Guest cart service.
//!
//! A thin client over the server-held anonymous cart. The only local state is
//! the opaque cart token in the shared store, which other tabs also write;
//! the in-memory id is a convenience copy that must be re-pointed whenever an
//! external change is observed ("last external write observed wins" — two
//! tabs' concurrent mutations are never merged).

use std::sync::{Arc, Mutex};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    backend::{CartSnapshot, GuestCartBackend, GuestConfirmation, GuestItemSpec},
    domain::checkout::billing::BillingInfo,
    ids::{GuestCartId, LineItemId},
    store::{GUEST_TOKEN_KEY, LocalStore, StoreError, StoreEvent},
};

use super::errors::GuestCartError;

/// Client for the server-held anonymous cart.
pub struct GuestCartService {
    backend: Arc<dyn GuestCartBackend>,
    store: Arc<dyn LocalStore>,
    token_key: String,
    cart_id: Mutex<Option<GuestCartId>>,
}

impl std::fmt::Debug for GuestCartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestCartService").finish_non_exhaustive()
    }
}

impl GuestCartService {
    /// Create a service over the given backend and shared store.
    #[must_use]
    pub fn new(backend: Arc<dyn GuestCartBackend>, store: Arc<dyn LocalStore>) -> Self {
        Self::with_token_key(backend, store, GUEST_TOKEN_KEY)
    }

    /// Create a service using a non-default token key.
    #[must_use]
    pub fn with_token_key(
        backend: Arc<dyn GuestCartBackend>,
        store: Arc<dyn LocalStore>,
        token_key: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            token_key: token_key.into(),
            cart_id: Mutex::new(None),
        }
    }

    /// Request a new anonymous cart from the server and store its token.
    ///
    /// # Errors
    ///
    /// - [`GuestCartError::CreationFailed`] when the server rejects the
    ///   request; the caller must retry or fall back to requiring sign-in.
    /// - [`GuestCartError::Store`] when the token cannot be persisted.
    pub async fn create(&self) -> Result<GuestCartId, GuestCartError> {
        let id = self
            .backend
            .create_cart()
            .await
            .map_err(GuestCartError::CreationFailed)?;

        self.store.put(&self.token_key, &id.to_string())?;
        self.set_cart_id(Some(id))?;

        info!(cart = %id, "guest cart created");

        Ok(id)
    }

    /// The id of the active guest cart, re-read from the shared token first
    /// so an id written by another tab is always honoured.
    ///
    /// # Errors
    ///
    /// - [`GuestCartError::NoActiveCart`] when no (parsable) token exists.
    /// - [`GuestCartError::Store`] when the store fails.
    pub fn active_cart_id(&self) -> Result<GuestCartId, GuestCartError> {
        self.resync_token()?.ok_or(GuestCartError::NoActiveCart)
    }

    /// Fetch the authoritative snapshot of the active cart.
    ///
    /// # Errors
    ///
    /// As for [`Self::active_cart_id`], plus [`GuestCartError::Remote`] when
    /// the backend call fails.
    pub async fn fetch(&self) -> Result<CartSnapshot, GuestCartError> {
        let id = self.active_cart_id()?;

        Ok(self.backend.get_cart(id).await?)
    }

    /// Add an item (unified shape only; legacy callers adapt via
    /// [`crate::backend::LegacyGuestItem`] before reaching this boundary).
    ///
    /// # Errors
    ///
    /// As for [`Self::fetch`].
    pub async fn add_item(&self, item: GuestItemSpec) -> Result<(), GuestCartError> {
        let id = self.active_cart_id()?;

        self.backend.add_item(id, item).await?;

        Ok(())
    }

    /// Remove an item, then re-fetch so the returned snapshot is guaranteed
    /// to match the server.
    ///
    /// # Errors
    ///
    /// As for [`Self::fetch`].
    pub async fn remove_item(&self, item: LineItemId) -> Result<CartSnapshot, GuestCartError> {
        let id = self.active_cart_id()?;

        self.backend.remove_item(id, item).await?;

        Ok(self.backend.get_cart(id).await?)
    }

    /// Delete the server cart and drop the local token.
    ///
    /// # Errors
    ///
    /// As for [`Self::fetch`].
    pub async fn clear(&self) -> Result<(), GuestCartError> {
        let id = self.active_cart_id()?;

        self.backend.delete_cart(id).await?;
        self.drop_local_state()?;

        Ok(())
    }

    /// Submit final billing details for the guest order.
    ///
    /// On success the local cart state is cleared and the confirmation data
    /// (email + code) is returned so account creation can be offered.
    ///
    /// # Errors
    ///
    /// As for [`Self::fetch`].
    pub async fn complete_checkout(
        &self,
        billing: BillingInfo,
    ) -> Result<GuestConfirmation, GuestCartError> {
        let id = self.active_cart_id()?;

        let confirmation = self.backend.complete_checkout(id, billing).await?;

        self.drop_local_state()?;

        info!(cart = %id, "guest checkout completed");

        Ok(confirmation)
    }

    /// Re-read the shared token and re-point the in-memory id at it.
    ///
    /// Called before every id-bearing operation: the token is the one piece
    /// of state another tab can write, so it must be treated as potentially
    /// stale immediately after any read.
    ///
    /// # Errors
    ///
    /// Returns [`GuestCartError::Store`] when the store fails.
    pub fn resync_token(&self) -> Result<Option<GuestCartId>, GuestCartError> {
        let id = match self.store.get(&self.token_key)? {
            None => None,
            Some(raw) => match raw.parse::<GuestCartId>() {
                Ok(id) => Some(id),
                Err(error) => {
                    warn!(%error, "ignoring unparsable guest cart token");
                    None
                }
            },
        };

        self.set_cart_id(id)?;

        Ok(id)
    }

    /// Apply an externally observed store change.
    pub fn apply_store_event(&self, event: &StoreEvent) {
        if event.key != self.token_key {
            return;
        }

        let id = event
            .value
            .as_deref()
            .and_then(|raw| raw.parse::<GuestCartId>().ok());

        debug!(cart = ?id, "guest cart token changed externally");

        if self.set_cart_id(id).is_err() {
            warn!("could not update guest cart id after external change");
        }
    }

    /// Watch the shared token for changes made by other tabs, re-pointing the
    /// in-memory id as they arrive. Runs until the store closes its channel.
    pub fn spawn_token_watcher(self: Arc<Self>) -> JoinHandle<()> {
        let mut events = self.store.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.apply_store_event(&event),
                    // A lagged receiver just resyncs from the token itself.
                    Err(RecvError::Lagged(_)) => {
                        let _ = self.resync_token();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn drop_local_state(&self) -> Result<(), GuestCartError> {
        self.store.remove(&self.token_key)?;
        self.set_cart_id(None)?;

        Ok(())
    }

    fn set_cart_id(&self, id: Option<GuestCartId>) -> Result<(), GuestCartError> {
        let mut cart_id = self
            .cart_id
            .lock()
            .map_err(|e| GuestCartError::Store(StoreError::Backend(e.to_string())))?;

        *cart_id = id;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::{
        backend::{LegacyGuestItem, MockGuestCartBackend, RemoteError},
        domain::{carts::models::ItemKind, checkout::billing::{BillingInfo, PaymentMethod}},
        store::MemoryStore,
    };

    use super::*;

    fn spec() -> GuestItemSpec {
        GuestItemSpec {
            kind: ItemKind::EventTicket,
            ref_id: "evt-1".to_owned(),
            title: "Standard".to_owned(),
            quantity: 1,
            price: Decimal::from(1000),
            metadata: serde_json::Value::Null,
        }
    }

    fn billing() -> BillingInfo {
        BillingInfo {
            full_name: "Asha Rai".to_owned(),
            email: "asha@example.com".to_owned(),
            phone: "9812345678".to_owned(),
            method: PaymentMethod::MobileMoney,
            card: None,
        }
    }

    #[tokio::test]
    async fn create_stores_the_token() {
        let id = GuestCartId::generate();
        let mut backend = MockGuestCartBackend::new();
        backend.expect_create_cart().returning(move || Ok(id));

        let store = Arc::new(MemoryStore::new());
        let service = GuestCartService::new(Arc::new(backend), store.clone());

        let created = service.create().await.expect("create should succeed");

        assert_eq!(created, id);
        assert_eq!(
            store.get(GUEST_TOKEN_KEY).expect("get should succeed"),
            Some(id.to_string())
        );
    }

    #[tokio::test]
    async fn create_surfaces_server_rejection() {
        let mut backend = MockGuestCartBackend::new();
        backend
            .expect_create_cart()
            .returning(|| Err(RemoteError::Rejected("no capacity".to_owned())));

        let service = GuestCartService::new(Arc::new(backend), Arc::new(MemoryStore::new()));
        let result = service.create().await;

        assert!(
            matches!(result, Err(GuestCartError::CreationFailed(_))),
            "expected CreationFailed, got {result:?}"
        );
    }

    #[tokio::test]
    async fn operations_without_a_token_return_no_active_cart() {
        let service = GuestCartService::new(
            Arc::new(MockGuestCartBackend::new()),
            Arc::new(MemoryStore::new()),
        );

        let result = service.fetch().await;

        assert!(
            matches!(result, Err(GuestCartError::NoActiveCart)),
            "expected NoActiveCart, got {result:?}"
        );
    }

    #[tokio::test]
    async fn add_item_targets_the_token_cart() {
        let id = GuestCartId::generate();
        let mut backend = MockGuestCartBackend::new();
        backend
            .expect_add_item()
            .withf(move |cart, item| *cart == id && item.ref_id == "evt-1")
            .returning(|_, _| Ok(()));

        let store = Arc::new(MemoryStore::new());
        store
            .put(GUEST_TOKEN_KEY, &id.to_string())
            .expect("put should succeed");

        let service = GuestCartService::new(Arc::new(backend), store);

        service.add_item(spec()).await.expect("add_item should succeed");
    }

    #[tokio::test]
    async fn legacy_items_normalize_before_the_boundary() {
        let id = GuestCartId::generate();
        let mut backend = MockGuestCartBackend::new();
        backend
            .expect_add_item()
            .withf(|_, item| item.kind == ItemKind::Product && item.quantity == 2)
            .returning(|_, _| Ok(()));

        let store = Arc::new(MemoryStore::new());
        store
            .put(GUEST_TOKEN_KEY, &id.to_string())
            .expect("put should succeed");

        let service = GuestCartService::new(Arc::new(backend), store);
        let legacy = LegacyGuestItem("prod-9".to_owned(), "Tote".to_owned(), Decimal::from(450), 2);

        service
            .add_item(legacy.into())
            .await
            .expect("add_item should succeed");
    }

    #[tokio::test]
    async fn remove_item_refetches_the_snapshot() {
        let id = GuestCartId::generate();
        let item = LineItemId::generate();

        let mut backend = MockGuestCartBackend::new();
        backend
            .expect_remove_item()
            .withf(move |cart, removed| *cart == id && *removed == item)
            .returning(|_, _| Ok(()));
        backend
            .expect_get_cart()
            .returning(|_| Ok(CartSnapshot::default()));

        let store = Arc::new(MemoryStore::new());
        store
            .put(GUEST_TOKEN_KEY, &id.to_string())
            .expect("put should succeed");

        let service = GuestCartService::new(Arc::new(backend), store);
        let snapshot = service.remove_item(item).await.expect("remove should succeed");

        assert!(snapshot.items.is_empty(), "snapshot reflects the server");
    }

    #[tokio::test]
    async fn clear_deletes_the_server_cart_and_the_token() {
        let id = GuestCartId::generate();
        let mut backend = MockGuestCartBackend::new();
        backend.expect_delete_cart().returning(|_| Ok(()));

        let store = Arc::new(MemoryStore::new());
        store
            .put(GUEST_TOKEN_KEY, &id.to_string())
            .expect("put should succeed");

        let service = GuestCartService::new(Arc::new(backend), store.clone());
        service.clear().await.expect("clear should succeed");

        assert_eq!(store.get(GUEST_TOKEN_KEY).expect("get should succeed"), None);
        assert!(
            matches!(service.fetch().await, Err(GuestCartError::NoActiveCart)),
            "no cart after clear"
        );
    }

    #[tokio::test]
    async fn complete_checkout_surfaces_confirmation_and_clears_local_state() {
        let id = GuestCartId::generate();
        let mut backend = MockGuestCartBackend::new();
        backend.expect_complete_checkout().returning(|_, _| {
            Ok(GuestConfirmation {
                email: "asha@example.com".to_owned(),
                confirmation_code: "TKT-1234".to_owned(),
            })
        });

        let store = Arc::new(MemoryStore::new());
        store
            .put(GUEST_TOKEN_KEY, &id.to_string())
            .expect("put should succeed");

        let service = GuestCartService::new(Arc::new(backend), store.clone());
        let confirmation = service
            .complete_checkout(billing())
            .await
            .expect("checkout should succeed");

        assert_eq!(confirmation.confirmation_code, "TKT-1234");
        assert_eq!(store.get(GUEST_TOKEN_KEY).expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn external_token_change_repoints_the_service() {
        let old_id = GuestCartId::generate();
        let new_id = GuestCartId::generate();

        let mut backend = MockGuestCartBackend::new();
        backend
            .expect_get_cart()
            .withf(move |cart| *cart == new_id)
            .returning(|_| Ok(CartSnapshot::default()));

        let store = Arc::new(MemoryStore::new());
        store
            .put(GUEST_TOKEN_KEY, &old_id.to_string())
            .expect("put should succeed");

        let service = GuestCartService::new(Arc::new(backend), store.clone());
        service.resync_token().expect("resync should succeed");

        // Another tab replaces the cart.
        service.apply_store_event(&StoreEvent {
            key: GUEST_TOKEN_KEY.to_owned(),
            value: Some(new_id.to_string()),
        });
        store
            .put(GUEST_TOKEN_KEY, &new_id.to_string())
            .expect("put should succeed");

        // The next read targets the new cart, not the stale one.
        service.fetch().await.expect("fetch should succeed");
    }
}
