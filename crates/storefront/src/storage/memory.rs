//! In-process storage backend.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{DEFAULT_EVENT_CAPACITY, Result, Storage, StorageChange, StorageEvent, TabId};

/// Storage held in memory and shared between sessions by cloning.
///
/// Every clone refers to the same entries and the same event channel, so
/// sessions built on clones behave like tabs of one browser profile.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<MemoryStorageInner>,
}

struct MemoryStorageInner {
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    /// Create an empty store with the default event capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty store whose event channel buffers `capacity` events
    /// per subscriber before older ones are dropped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(MemoryStorageInner {
                entries: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    fn notify(&self, key: &str, change: StorageChange, origin: TabId) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.inner.events.send(StorageEvent {
            key: key.to_owned(),
            change,
            origin,
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .inner
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str, origin: TabId) -> Result<()> {
        {
            let mut entries = self
                .inner
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            entries.insert(key.to_owned(), value.to_owned());
        }
        self.notify(key, StorageChange::Set, origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: TabId) -> Result<()> {
        let removed = {
            let mut entries = self
                .inner
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            entries.remove(key).is_some()
        };
        if removed {
            self.notify(key, StorageChange::Removed, origin);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set("k", "v", TabId::new()).unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_set_and_remove_notify() {
        let storage = MemoryStorage::new();
        let mut rx = storage.subscribe();
        let tab = TabId::new();

        storage.set("cart", "[]", tab).unwrap();
        storage.remove("cart", tab).unwrap();
        storage.remove("cart", tab).unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.key, "cart");
        assert_eq!(first.change, StorageChange::Set);
        assert_eq!(first.origin, tab);
        assert_eq!(rx.try_recv().unwrap().change, StorageChange::Removed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_last_write_wins() {
        let storage = MemoryStorage::new();
        storage.set("k", "first", TabId::new()).unwrap();
        storage.set("k", "second", TabId::new()).unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("second"));
    }
}
