//! Persisted carts, one per scope.
//!
//! A scope is either the shared guest cart or the cart of one logged-in
//! shopper. Scopes are fully independent: logging in never merges the
//! guest cart into the user's cart.

use std::sync::Arc;

use shopaholic_core::{Cart, Email, User};

use crate::storage::{self, Storage, TabId, keys};

/// Whose cart is being read or written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartScope {
    /// The unauthenticated shopper.
    Guest,
    /// A logged-in shopper, keyed by email.
    User(Email),
}

impl CartScope {
    /// Scope for the given identity: the user's own cart if someone is
    /// logged in, the guest cart otherwise.
    #[must_use]
    pub fn for_identity(user: Option<&User>) -> Self {
        user.map_or(Self::Guest, |user| Self::User(user.email.clone()))
    }

    /// Storage key holding this scope's cart.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Guest => keys::GUEST_CART.to_owned(),
            Self::User(email) => keys::user_cart(email),
        }
    }
}

/// Reads and writes carts for one session.
#[derive(Clone)]
pub struct CartStore {
    storage: Arc<dyn Storage>,
    tab: TabId,
}

impl CartStore {
    /// Create a store writing to `storage` on behalf of `tab`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, tab: TabId) -> Self {
        Self { storage, tab }
    }

    /// Load the cart persisted for `scope`.
    ///
    /// Missing or malformed data yields an empty cart.
    #[must_use]
    pub fn load(&self, scope: &CartScope) -> Cart {
        storage::read_json(self.storage.as_ref(), &scope.storage_key()).unwrap_or_default()
    }

    /// Overwrite the cart persisted for `scope` and notify other sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be written.
    pub fn save(&self, scope: &CartScope, cart: &Cart) -> storage::Result<()> {
        let key = scope.storage_key();
        storage::write_json(self.storage.as_ref(), &key, cart, self.tab)?;
        tracing::debug!(key = %key, lines = cart.len(), "Saved cart");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopaholic_core::{Price, Product, ProductId};

    use super::*;
    use crate::storage::MemoryStorage;

    fn pepsi() -> Product {
        Product {
            id: ProductId::new("1"),
            category: "Cool Drinks".to_owned(),
            brand: "Pepsi".to_owned(),
            price: Price::from_whole(100),
            name: None,
            description: None,
            images: Vec::new(),
            new_arrival: false,
            best_seller: false,
        }
    }

    fn user_scope() -> CartScope {
        CartScope::User(Email::parse("asha@example.com").unwrap())
    }

    #[test]
    fn test_scope_keys() {
        assert_eq!(CartScope::Guest.storage_key(), "cart");
        assert_eq!(user_scope().storage_key(), "cart_asha@example.com");
        assert_eq!(CartScope::for_identity(None), CartScope::Guest);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()), TabId::new());
        assert!(store.load(&CartScope::Guest).is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let storage = MemoryStorage::new();
        storage.set("cart", "{{{ not json", TabId::new()).unwrap();
        let store = CartStore::new(Arc::new(storage), TabId::new());
        assert!(store.load(&CartScope::Guest).is_empty());
    }

    #[test]
    fn test_scopes_are_independent() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()), TabId::new());
        let mut cart = Cart::new();
        cart.add_or_increment(&pepsi());

        store.save(&CartScope::Guest, &cart).unwrap();

        assert_eq!(store.load(&CartScope::Guest), cart);
        assert!(store.load(&user_scope()).is_empty());
    }

    #[test]
    fn test_save_overwrites() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()), TabId::new());
        let mut cart = Cart::new();
        cart.add_or_increment(&pepsi());
        store.save(&user_scope(), &cart).unwrap();

        cart.add_or_increment(&pepsi());
        store.save(&user_scope(), &cart).unwrap();
        assert_eq!(store.load(&user_scope()).quantity_of(&ProductId::new("1")), 2);

        store.save(&user_scope(), &Cart::new()).unwrap();
        assert!(store.load(&user_scope()).is_empty());
        assert!(store.load(&CartScope::Guest).is_empty());
    }
}
