//! In-memory store implementation.

use std::sync::Mutex;

use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

use super::{LocalStore, StoreError, StoreEvent};

const EVENT_CAPACITY: usize = 64;

/// In-process [`LocalStore`].
///
/// Two `Arc` handles to one `MemoryStore` behave like two browser tabs over
/// the same local storage, which is exactly how the cross-tab tests use it.
#[derive(Debug)]
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, String>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            entries: Mutex::new(FxHashMap::default()),
            events,
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, key: &str, value: Option<String>) {
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.events.send(StoreEvent {
            key: key.to_owned(),
            value,
        });
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            entries.insert(key.to_owned(), value.to_owned());
        }

        self.notify(key, Some(value.to_owned()));

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let removed = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| StoreError::Backend(e.to_string()))?;

            entries.remove(key)
        };

        if removed.is_some() {
            self.notify(key, None);
        }

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
