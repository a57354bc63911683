//! Shopping cart contents and quantity arithmetic.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s with at most one line per
//! product. Quantities are always at least one: a line whose quantity would
//! drop to zero is removed instead.
//!
//! The persisted form is a JSON array of product objects, each carrying an
//! extra `quantity` field (absent means 1). Loading normalizes the data so
//! the invariants hold even if another writer broke them.

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::ProductId;

/// One product in the cart.
///
/// The product is a snapshot taken when it was first added, so later
/// catalog edits do not change what the cart shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartLine {
    fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    /// Product identifier of this line.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.product.id
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id() == id)
    }

    /// Quantity of a product, zero if it is not in the cart.
    #[must_use]
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.line(id).map_or(0, |line| line.quantity)
    }

    fn line_mut(&mut self, id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.id() == id)
    }

    /// Add one unit of `product`.
    ///
    /// Bumps the existing line if the product is already in the cart;
    /// otherwise appends a snapshot of it with quantity 1. Returns the new
    /// quantity.
    pub fn add_or_increment(&mut self, product: &Product) -> u32 {
        if let Some(line) = self.line_mut(&product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return line.quantity;
        }
        self.lines.push(CartLine::new(product.clone()));
        1
    }

    /// Add one unit to an existing line.
    ///
    /// Returns the new quantity, or `None` (and changes nothing) if the
    /// product is not in the cart.
    pub fn increment(&mut self, id: &ProductId) -> Option<u32> {
        let line = self.line_mut(id)?;
        line.quantity = line.quantity.saturating_add(1);
        Some(line.quantity)
    }

    /// Take one unit off an existing line, removing it when it reaches zero.
    ///
    /// Returns the remaining quantity (`Some(0)` when the line was removed),
    /// or `None` if the product is not in the cart.
    pub fn decrement(&mut self, id: &ProductId) -> Option<u32> {
        let index = self.lines.iter().position(|line| line.id() == id)?;
        let remaining = self.lines.get(index)?.quantity.saturating_sub(1);
        if remaining == 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = remaining;
        }
        Some(remaining)
    }

    /// Remove a product regardless of its quantity.
    pub fn remove(&mut self, id: &ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| line.id() == id)?;
        Some(self.lines.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Build a cart from stored lines, dropping zero quantities and merging
    /// duplicate products into the first occurrence.
    fn from(stored: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in stored.into_iter().filter(|line| line.quantity > 0) {
            match cart.line_mut(line.id()) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

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

    #[test]
    fn test_add_new_product_appends_line() {
        let mut cart = Cart::new();
        cart.add_or_increment(&product("1", "Pepsi", 100));

        let before = cart.len();
        let qty = cart.add_or_increment(&product("2", "Coke", 5000));

        assert_eq!(qty, 1);
        assert_eq!(cart.len(), before + 1);
        assert_eq!(cart.lines().last().unwrap().id().as_str(), "2");
    }

    #[test]
    fn test_add_existing_product_increments() {
        let pepsi = product("1", "Pepsi", 100);
        let mut cart = Cart::new();
        cart.add_or_increment(&pepsi);
        cart.add_or_increment(&pepsi);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(&pepsi.id), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_line_is_a_snapshot() {
        let mut pepsi = product("1", "Pepsi", 100);
        let mut cart = Cart::new();
        cart.add_or_increment(&pepsi);

        pepsi.price = Price::from_whole(999);
        cart.add_or_increment(&pepsi);

        assert_eq!(cart.line(&pepsi.id).unwrap().product.price, Price::from_whole(100));
    }

    #[test]
    fn test_decrement_removes_at_zero() {
        let coke = product("2", "Coke", 5000);
        let mut cart = Cart::new();
        for _ in 0..3 {
            cart.add_or_increment(&coke);
        }

        assert_eq!(cart.decrement(&coke.id), Some(2));
        assert_eq!(cart.decrement(&coke.id), Some(1));
        assert_eq!(cart.decrement(&coke.id), Some(0));
        assert!(cart.line(&coke.id).is_none());
        assert_eq!(cart.decrement(&coke.id), None);
    }

    #[test]
    fn test_missing_line_is_noop() {
        let mut cart = Cart::new();
        cart.add_or_increment(&product("1", "Pepsi", 100));
        let before = cart.clone();

        let ghost = ProductId::new("nope");
        assert_eq!(cart.increment(&ghost), None);
        assert_eq!(cart.decrement(&ghost), None);
        assert!(cart.remove(&ghost).is_none());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let pepsi = product("1", "Pepsi", 100);
        let mut cart = Cart::new();
        cart.add_or_increment(&pepsi);
        cart.add_or_increment(&pepsi);
        cart.add_or_increment(&product("2", "Coke", 5000));

        cart.remove(&pepsi.id);
        let once = cart.clone();
        cart.remove(&pepsi.id);

        assert_eq!(cart, once);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_stored_line_without_quantity_defaults_to_one() {
        let json = r#"[{"_id":"1","category":"Cool Drinks","brand":"Pepsi","price":100}]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.quantity_of(&ProductId::new("1")), 1);
    }

    #[test]
    fn test_load_normalizes_zero_and_duplicates() {
        let json = r#"[
            {"_id":"1","category":"c","brand":"Pepsi","price":100,"quantity":2},
            {"_id":"2","category":"c","brand":"Coke","price":50,"quantity":0},
            {"_id":"1","category":"c","brand":"Pepsi","price":100,"quantity":3}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("1")), 5);
    }

    #[test]
    fn test_persisted_layout_is_flat() {
        let mut cart = Cart::new();
        cart.add_or_increment(&product("1", "Pepsi", 100));
        let value = serde_json::to_value(&cart).unwrap();

        assert_eq!(value[0]["_id"], "1");
        assert_eq!(value[0]["brand"], "Pepsi");
        assert_eq!(value[0]["quantity"], 1);
    }
}
