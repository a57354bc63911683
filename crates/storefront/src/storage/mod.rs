//! Key/value storage shared by every session ("tab") of one profile.
//!
//! The storefront keeps all client state in a flat string-to-string store,
//! the same shape as a browser's local storage. Each write is broadcast as a
//! [`StorageEvent`] so that other sessions can react to it.
//!
//! # Keys
//!
//! See [`keys`] for the layout. Values are JSON; anything that fails to
//! parse is treated as absent by [`read_json`].

mod file;
mod memory;

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Default capacity of the storage event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized.
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key cannot be stored by this backend.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Identifies one session writing to shared storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    /// A fresh random tab identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageChange {
    Set,
    Removed,
}

/// Notification that a key changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub change: StorageChange,
    /// Session that made the change.
    pub origin: TabId,
}

/// A synchronous key/value store with change notifications.
///
/// Implementations must be safe to share between sessions; the last write
/// to a key wins and nothing is merged.
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value, and notify
    /// subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be persisted. Subscribers
    /// are not notified in that case.
    fn set(&self, key: &str, value: &str, origin: TabId) -> Result<()>;

    /// Delete `key` and notify subscribers. Deleting a missing key is not
    /// an error and sends no notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not be updated.
    fn remove(&self, key: &str, origin: TabId) -> Result<()>;

    /// Subscribe to change notifications for every key.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Storage key layout.
pub mod keys {
    use shopaholic_core::Email;

    /// Cart of the unauthenticated shopper.
    pub const GUEST_CART: &str = "cart";

    /// Prefix of per-user cart keys (`cart_<email>`).
    pub const USER_CART_PREFIX: &str = "cart_";

    /// Currently logged-in shopper.
    pub const USER: &str = "user";

    /// Admin-maintained category list.
    pub const CATEGORIES: &str = "categories";

    /// Admin-maintained brands per category.
    pub const BRAND_OPTIONS: &str = "brandOptions";

    /// Cart key for a logged-in shopper.
    #[must_use]
    pub fn user_cart(email: &Email) -> String {
        format!("{USER_CART_PREFIX}{email}")
    }
}

/// Read and parse a JSON value.
///
/// Missing keys, unreadable storage and malformed JSON all yield `None`;
/// the latter two are logged.
pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read storage entry");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed storage entry");
            None
        }
    }
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
    origin: TabId,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw, origin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_missing_and_malformed() {
        let storage = MemoryStorage::new();
        let tab = TabId::new();

        assert_eq!(read_json::<Vec<u32>>(&storage, "nums"), None);

        storage.set("nums", "[1, 2,", tab).unwrap();
        assert_eq!(read_json::<Vec<u32>>(&storage, "nums"), None);

        storage.set("nums", "{\"not\":\"a list\"}", tab).unwrap();
        assert_eq!(read_json::<Vec<u32>>(&storage, "nums"), None);
    }

    #[test]
    fn test_write_then_read_json() {
        let storage = MemoryStorage::new();
        write_json(&storage, "nums", &[3, 1, 2], TabId::new()).unwrap();
        assert_eq!(read_json::<Vec<u32>>(&storage, "nums"), Some(vec![3, 1, 2]));
    }

    #[test]
    fn test_user_cart_key() {
        let email = shopaholic_core::Email::parse("asha@example.com").unwrap();
        assert_eq!(keys::user_cart(&email), "cart_asha@example.com");
    }

    #[test]
    fn test_tab_ids_are_unique() {
        assert_ne!(TabId::new(), TabId::new());
    }
}
