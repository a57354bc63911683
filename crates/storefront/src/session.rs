//! One shopper's storefront session.
//!
//! A [`StorefrontSession`] plays the part of a browser tab: it owns the
//! active identity, the cart of that identity's scope, the loaded catalog
//! and the current filter. Every change is persisted first and then
//! announced on the session's own event channel. Sessions sharing one
//! [`Storage`] see each other's writes through [`StorefrontSession::sync`]
//! or [`StorefrontSession::next_sync`].
//!
//! # Example
//!
//! ```rust,ignore
//! let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&config.storage_dir)?);
//! let mut session = StorefrontSession::open(storage);
//! session.refresh_catalog(&api, None).await;
//! session.set_filter(["Pepsi"], None);
//! let product = session.visible_products()[0].clone();
//! session.add_or_increment(&product)?;
//! println!("{}", session.totals());
//! ```

use std::sync::Arc;

use secrecy::SecretString;
use shopaholic_core::catalog;
use shopaholic_core::{
    Cart, CatalogIndex, Coupon, Email, Filter, PaymentMethod, Price, Product, ProductId, Totals,
    User,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::api::{AccountDetails, ApiClient, ApiError, PaymentReceipt, PaymentRequest};
use crate::cart_store::{CartScope, CartStore};
use crate::error::{Result, SessionError};
use crate::storage::{self, DEFAULT_EVENT_CAPACITY, Storage, TabId, keys};
use crate::sync::{CrossTabSync, Notification, SyncState, Watch};

/// Whether a change was made by this session or picked up from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    Local,
    OtherTab,
}

/// Announced to subscribers after session state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Cart contents changed; totals are stale.
    Cart(ChangeSource),
    /// Brand selection or price cap changed.
    Filter,
    /// A new product list was loaded.
    Catalog,
    /// Someone logged in or out.
    Identity(ChangeSource),
}

/// State of one storefront session.
pub struct StorefrontSession {
    storage: Arc<dyn Storage>,
    tab: TabId,
    carts: CartStore,
    sync: CrossTabSync,
    user: Option<User>,
    cart: Cart,
    /// Set by logout: the view is empty but the scope's persisted cart is
    /// not, so the next mutation starts from storage.
    view_cleared: bool,
    products: Vec<Product>,
    index: CatalogIndex,
    filter: Filter,
    events: broadcast::Sender<SessionEvent>,
}

impl StorefrontSession {
    /// Open a session on `storage`, restoring the persisted identity and
    /// that identity's cart.
    #[must_use]
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let tab = TabId::new();
        let sync = CrossTabSync::new(tab, storage.subscribe());
        let carts = CartStore::new(Arc::clone(&storage), tab);
        let user: Option<User> = storage::read_json(storage.as_ref(), keys::USER);
        let cart = carts.load(&CartScope::for_identity(user.as_ref()));
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);

        debug!(
            tab = %tab,
            user = ?user.as_ref().map(|u| u.email.as_str()),
            lines = cart.len(),
            "Opened storefront session"
        );

        Self {
            storage,
            tab,
            carts,
            sync,
            user,
            cart,
            view_cleared: false,
            products: Vec::new(),
            index: CatalogIndex::default(),
            filter: Filter::default(),
            events,
        }
    }

    /// Identifier this session writes under.
    #[must_use]
    pub const fn tab_id(&self) -> TabId {
        self.tab
    }

    /// Subscribe to change announcements.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// The logged-in shopper, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Profile of the logged-in shopper. Same as [`Self::user`].
    #[must_use]
    pub const fn profile(&self) -> Option<&User> {
        self.user()
    }

    /// Scope whose cart is active.
    #[must_use]
    pub fn scope(&self) -> CartScope {
        CartScope::for_identity(self.user.as_ref())
    }

    /// Make `user` the active identity and switch to their cart.
    ///
    /// The guest cart is left as it is; nothing is merged.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity could not be persisted.
    pub fn sign_in(&mut self, user: User) -> Result<()> {
        storage::write_json(self.storage.as_ref(), keys::USER, &user, self.tab)?;
        info!(email = %user.email, "Signed in");
        self.user = Some(user);
        self.cart = self.carts.load(&self.scope());
        self.view_cleared = false;
        self.emit(SessionEvent::Identity(ChangeSource::Local));
        self.emit(SessionEvent::Cart(ChangeSource::Local));
        Ok(())
    }

    /// Log in against the backend, then [`Self::sign_in`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the backend rejects the credentials
    /// or cannot be reached, or a storage error.
    #[instrument(skip(self, api, password), fields(email = %email))]
    pub async fn login(
        &mut self,
        api: &ApiClient,
        email: &Email,
        password: &SecretString,
    ) -> Result<()> {
        let user = api.login(email, password).await?;
        self.sign_in(user)
    }

    /// Forget the active identity and empty the in-memory cart.
    ///
    /// Persisted carts, the guest cart included, are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity entry could not be removed.
    pub fn logout(&mut self) -> Result<()> {
        self.storage.remove(keys::USER, self.tab)?;
        if let Some(user) = self.user.take() {
            info!(email = %user.email, "Logged out");
        }
        self.cart = Cart::new();
        self.view_cleared = true;
        self.emit(SessionEvent::Identity(ChangeSource::Local));
        self.emit(SessionEvent::Cart(ChangeSource::Local));
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The active cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Subtotal, GST and total of the active cart.
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals::from_cart(&self.cart)
    }

    /// Totals after applying `coupon`, if any.
    #[must_use]
    pub fn quote(&self, coupon: Option<&Coupon>) -> Totals {
        let totals = self.totals();
        coupon.map_or(totals, |coupon| totals.with_discount(coupon.percent_off))
    }

    /// Add one unit of `product`. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted; the in-memory
    /// cart is unchanged in that case.
    pub fn add_or_increment(&mut self, product: &Product) -> Result<u32> {
        let mut next = self.working_cart();
        let quantity = next.add_or_increment(product);
        self.commit_cart(next)?;
        Ok(quantity)
    }

    /// Add one unit to an existing line.
    ///
    /// Returns the new quantity, or `None` (and writes nothing) if the
    /// product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn increment(&mut self, id: &ProductId) -> Result<Option<u32>> {
        let mut next = self.working_cart();
        let Some(quantity) = next.increment(id) else {
            debug!(id = %id, "Increment ignored; product not in cart");
            return Ok(None);
        };
        self.commit_cart(next)?;
        Ok(Some(quantity))
    }

    /// Remove one unit from a line; a line at quantity 1 is removed.
    ///
    /// Returns the remaining quantity (`Some(0)` when the line was
    /// removed), or `None` if the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn decrement(&mut self, id: &ProductId) -> Result<Option<u32>> {
        let mut next = self.working_cart();
        let Some(quantity) = next.decrement(id) else {
            debug!(id = %id, "Decrement ignored; product not in cart");
            return Ok(None);
        };
        self.commit_cart(next)?;
        Ok(Some(quantity))
    }

    /// Remove a line entirely. Returns `false` if it was not present.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart could not be persisted.
    pub fn remove(&mut self, id: &ProductId) -> Result<bool> {
        let mut next = self.working_cart();
        if next.remove(id).is_none() {
            return Ok(false);
        }
        self.commit_cart(next)?;
        Ok(true)
    }

    fn working_cart(&self) -> Cart {
        if self.view_cleared {
            self.carts.load(&self.scope())
        } else {
            self.cart.clone()
        }
    }

    fn commit_cart(&mut self, next: Cart) -> Result<()> {
        self.carts.save(&self.scope(), &next)?;
        self.cart = next;
        self.view_cleared = false;
        self.emit(SessionEvent::Cart(ChangeSource::Local));
        Ok(())
    }

    /// Pay for the active cart.
    ///
    /// On success the cart is emptied. On failure the cart is untouched
    /// and a declined payment surfaces as `SessionError::Payment` with the
    /// backend's message.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyCart` when there is nothing to pay for,
    /// `SessionError::Payment` when the backend declines, or another
    /// error if the request or the final cart write fails.
    #[instrument(skip(self, api, account_details, coupon), fields(method = %method))]
    pub async fn checkout(
        &mut self,
        api: &ApiClient,
        method: PaymentMethod,
        account_details: Option<AccountDetails>,
        coupon: Option<Coupon>,
    ) -> Result<PaymentReceipt> {
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart);
        }

        let request = PaymentRequest::for_cart(&self.cart, method, account_details, coupon);
        let receipt = match api.initiate_payment(&request).await {
            Ok(receipt) => receipt,
            Err(ApiError::Rejected(message)) => return Err(SessionError::Payment(message)),
            Err(e) => return Err(e.into()),
        };

        info!(
            lines = self.cart.len(),
            total = %self.quote(request.coupon.as_ref()).total,
            "Checkout complete"
        );
        self.commit_cart(Cart::new())?;
        Ok(receipt)
    }

    // =========================================================================
    // Catalog & Filter
    // =========================================================================

    /// The loaded catalog in backend order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Categories and brands of the loaded catalog.
    #[must_use]
    pub const fn catalog_index(&self) -> &CatalogIndex {
        &self.index
    }

    /// The current filter.
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Products passing the current filter, in catalog order.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        catalog::visible_products(&self.products, &self.filter)
    }

    /// Replace the loaded catalog.
    pub fn set_catalog(&mut self, products: Vec<Product>) {
        self.index = CatalogIndex::build(&products);
        self.products = products;
        self.emit(SessionEvent::Catalog);
    }

    /// Reload the catalog from the backend.
    ///
    /// On failure the previous catalog stays in place and `false` is
    /// returned.
    pub async fn refresh_catalog(&mut self, api: &ApiClient, category: Option<&str>) -> bool {
        match api.list_products(category).await {
            Ok(products) => {
                self.set_catalog(products);
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh catalog; keeping last list");
                false
            }
        }
    }

    /// Replace the filter. No brands means every brand; `None` means no
    /// price cap.
    pub fn set_filter<I, S>(&mut self, brands: I, max_price: Option<Price>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = Filter::new(brands, max_price);
        self.emit(SessionEvent::Filter);
    }

    /// Reset to the default filter: every brand, capped at the top tier.
    pub fn clear_filter(&mut self) {
        self.filter = Filter::default();
        self.emit(SessionEvent::Filter);
    }

    /// Select `brand` if unselected, deselect it otherwise. Returns whether
    /// it is now selected.
    pub fn toggle_brand(&mut self, brand: &str) -> bool {
        let selected = self.filter.toggle_brand(brand);
        self.emit(SessionEvent::Filter);
        selected
    }

    /// Cap prices at the given tier (clamped to the tier table).
    pub fn set_price_tier(&mut self, index: usize) {
        self.filter.set_price_tier(index);
        self.emit(SessionEvent::Filter);
    }

    // =========================================================================
    // Cross-tab sync
    // =========================================================================

    /// Listener state.
    #[must_use]
    pub const fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// Apply every change other sessions have made since the last call.
    ///
    /// Returns `true` if anything was reloaded.
    pub fn sync(&mut self) -> bool {
        let cart_key = self.scope().storage_key();
        let watch = Watch {
            cart_key: &cart_key,
            identity_key: keys::USER,
        };
        match self.sync.poll(watch) {
            Some(notification) => {
                self.reload(notification);
                true
            }
            None => false,
        }
    }

    /// Wait until another session changes the identity or the active cart,
    /// then apply it.
    ///
    /// Returns `false` once the storage has shut down.
    pub async fn next_sync(&mut self) -> bool {
        let cart_key = self.scope().storage_key();
        let watch = Watch {
            cart_key: &cart_key,
            identity_key: keys::USER,
        };
        match self.sync.wait(watch).await {
            Some(notification) => {
                self.reload(notification);
                true
            }
            None => false,
        }
    }

    fn reload(&mut self, notification: Notification) {
        let mut reload_cart = notification.cart;

        if notification.identity {
            let user: Option<User> = storage::read_json(self.storage.as_ref(), keys::USER);
            if user != self.user {
                debug!(
                    user = ?user.as_ref().map(|u| u.email.as_str()),
                    "Identity changed in another tab"
                );
                self.user = user;
                reload_cart = true;
                self.emit(SessionEvent::Identity(ChangeSource::OtherTab));
            }
        }

        if reload_cart {
            let cart = self.carts.load(&self.scope());
            self.view_cleared = false;
            if cart != self.cart {
                debug!(lines = cart.len(), "Cart changed in another tab");
                self.cart = cart;
                self.emit(SessionEvent::Cart(ChangeSource::OtherTab));
            }
        }

        self.sync.settle();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::MemoryStorage;

    fn product(id: &str, brand: &str, price: u32) -> Product {
        Product {
            id: ProductId::new(id),
            category: "Cool Drinks".to_owned(),
            brand: brand.to_owned(),
            price: Price::from_whole(price),
            name: None,
            description: None,
            images: Vec::new(),
            new_arrival: false,
            best_seller: false,
        }
    }

    fn asha() -> User {
        User {
            name: "Asha".to_owned(),
            email: Email::parse("asha@example.com").unwrap(),
            joined: None,
            phone: None,
            date_of_birth: None,
        }
    }

    fn session() -> (MemoryStorage, StorefrontSession) {
        let storage = MemoryStorage::new();
        let session = StorefrontSession::open(Arc::new(storage.clone()));
        (storage, session)
    }

    #[test]
    fn test_add_increment_decrement_remove() {
        let (_, mut session) = session();
        let pepsi = product("1", "Pepsi", 100);

        assert_eq!(session.add_or_increment(&pepsi).unwrap(), 1);
        assert_eq!(session.add_or_increment(&pepsi).unwrap(), 2);
        assert_eq!(session.increment(&pepsi.id).unwrap(), Some(3));
        assert_eq!(session.decrement(&pepsi.id).unwrap(), Some(2));
        assert!(session.remove(&pepsi.id).unwrap());
        assert!(!session.remove(&pepsi.id).unwrap());
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_missing_line_is_noop_without_write() {
        let (storage, mut session) = session();
        let mut rx = storage.subscribe();

        assert_eq!(session.increment(&ProductId::new("9")).unwrap(), None);
        assert_eq!(session.decrement(&ProductId::new("9")).unwrap(), None);

        assert!(rx.try_recv().is_err());
        assert_eq!(storage.get(keys::GUEST_CART).unwrap(), None);
    }

    #[test]
    fn test_mutations_persist_and_notify() {
        let (storage, mut session) = session();
        let mut events = session.subscribe();

        session.add_or_increment(&product("1", "Pepsi", 100)).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Cart(ChangeSource::Local)
        );
        let reopened = StorefrontSession::open(Arc::new(storage));
        assert_eq!(reopened.cart().quantity_of(&ProductId::new("1")), 1);
    }

    #[test]
    fn test_filter_and_totals_scenario() {
        let (_, mut session) = session();
        session.set_catalog(vec![product("1", "Pepsi", 100), product("2", "Coke", 5000)]);
        session.set_filter(Vec::<String>::new(), Some(Price::from_whole(1000)));

        let visible = session.visible_products();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, ProductId::new("1"));

        let coke = session.products()[1].clone();
        session.add_or_increment(&coke).unwrap();
        session.increment(&coke.id).unwrap();

        let totals = session.totals();
        assert_eq!(totals.subtotal, Decimal::from(10_000));
        assert_eq!(totals.tax, Decimal::from(1_800));
        assert_eq!(totals.total, Decimal::from(11_800));
    }

    #[test]
    fn test_filter_helpers_emit() {
        let (_, mut session) = session();
        let mut events = session.subscribe();

        assert!(session.toggle_brand("Pepsi"));
        session.set_price_tier(0);
        session.clear_filter();

        for _ in 0..3 {
            assert_eq!(events.try_recv().unwrap(), SessionEvent::Filter);
        }
        assert_eq!(session.filter(), &Filter::default());
    }

    #[test]
    fn test_sign_in_switches_scope_without_merging() {
        let (storage, mut session) = session();
        session.add_or_increment(&product("1", "Pepsi", 100)).unwrap();

        session.sign_in(asha()).unwrap();
        assert_eq!(session.scope(), CartScope::User(asha().email));
        assert!(session.cart().is_empty());

        session.add_or_increment(&product("2", "Coke", 5000)).unwrap();
        session.logout().unwrap();
        assert!(session.user().is_none());
        assert!(session.cart().is_empty());

        // Both persisted carts survive logout.
        let reopened = StorefrontSession::open(Arc::new(storage.clone()));
        assert_eq!(reopened.cart().quantity_of(&ProductId::new("1")), 1);
        let user_cart: Cart = storage::read_json(&storage, "cart_asha@example.com").unwrap();
        assert_eq!(user_cart.quantity_of(&ProductId::new("2")), 1);
    }

    #[test]
    fn test_guest_add_after_logout_keeps_guest_lines() {
        let (storage, mut session) = session();
        let pepsi = product("1", "Pepsi", 100);
        session.add_or_increment(&pepsi).unwrap();
        session.add_or_increment(&pepsi).unwrap();

        session.sign_in(asha()).unwrap();
        session.logout().unwrap();
        assert!(session.cart().is_empty());

        assert_eq!(session.add_or_increment(&product("2", "Coke", 5000)).unwrap(), 1);
        assert_eq!(session.cart().quantity_of(&pepsi.id), 2);

        let reopened = StorefrontSession::open(Arc::new(storage));
        assert_eq!(reopened.cart().quantity_of(&pepsi.id), 2);
        assert_eq!(reopened.cart().quantity_of(&ProductId::new("2")), 1);
    }

    #[test]
    fn test_other_tab_changes_are_picked_up() {
        let storage = MemoryStorage::new();
        let mut first = StorefrontSession::open(Arc::new(storage.clone()));
        let mut second = StorefrontSession::open(Arc::new(storage));
        let mut events = second.subscribe();

        first.add_or_increment(&product("1", "Pepsi", 100)).unwrap();
        assert!(!first.sync());

        assert!(second.sync());
        assert_eq!(second.cart(), first.cart());
        assert_eq!(second.sync_state(), SyncState::Idle);
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Cart(ChangeSource::OtherTab)
        );
    }

    #[test]
    fn test_other_tab_login_switches_cart() {
        let storage = MemoryStorage::new();
        let mut first = StorefrontSession::open(Arc::new(storage.clone()));
        let mut second = StorefrontSession::open(Arc::new(storage));

        first.sign_in(asha()).unwrap();
        first.add_or_increment(&product("2", "Coke", 5000)).unwrap();

        assert!(second.sync());
        assert_eq!(second.user(), Some(&asha()));
        assert_eq!(second.cart().quantity_of(&ProductId::new("2")), 1);
    }

    #[test]
    fn test_quote_applies_coupon_before_tax() {
        let (_, mut session) = session();
        session.add_or_increment(&product("1", "Pepsi", 1000)).unwrap();

        let quote = session.quote(Coupon::apply("SAVE10").as_ref());
        assert_eq!(quote.subtotal, Decimal::from(900));
        assert_eq!(quote.tax, Decimal::from(162));
        assert_eq!(quote.total, Decimal::from(1062));
    }
}
