//! Catalog filtering and category/brand indexing.
//!
//! Everything here is a pure function of a product slice: results borrow
//! from the input and preserve its order.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::Price;

/// Price ceilings offered by the storefront's price slider, in rupees.
pub const PRICE_TIERS: [u32; 6] = [100, 1_000, 3_000, 5_000, 7_000, 10_000];

const HIGHEST_TIER: u32 = PRICE_TIERS[PRICE_TIERS.len() - 1];

/// The active brand/price predicate.
///
/// An empty brand set means "every brand", not "no brand". A `max_price`
/// of `None` places no ceiling on price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(default)]
    pub selected_brands: BTreeSet<String>,
    #[serde(default)]
    pub max_price: Option<Price>,
}

impl Default for Filter {
    /// All brands, capped at the highest price tier.
    fn default() -> Self {
        Self {
            selected_brands: BTreeSet::new(),
            max_price: Some(Price::from_whole(HIGHEST_TIER)),
        }
    }
}

impl Filter {
    /// A filter that matches every product.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            selected_brands: BTreeSet::new(),
            max_price: None,
        }
    }

    /// Build a filter from a brand list and a price ceiling.
    #[must_use]
    pub fn new<I, S>(brands: I, max_price: Option<Price>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_brands: brands.into_iter().map(Into::into).collect(),
            max_price,
        }
    }

    /// Select `brand` if it is not selected, deselect it otherwise.
    ///
    /// Returns `true` if the brand is selected afterwards.
    pub fn toggle_brand(&mut self, brand: &str) -> bool {
        if self.selected_brands.remove(brand) {
            false
        } else {
            self.selected_brands.insert(brand.to_owned());
            true
        }
    }

    /// Set the ceiling to one of [`PRICE_TIERS`]; out-of-range indexes are
    /// clamped to the highest tier.
    pub fn set_price_tier(&mut self, index: usize) {
        let tier = PRICE_TIERS.get(index).copied().unwrap_or(HIGHEST_TIER);
        self.max_price = Some(Price::from_whole(tier));
    }

    /// Whether a single product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let brand_ok =
            self.selected_brands.is_empty() || self.selected_brands.contains(&product.brand);
        let price_ok = self.max_price.is_none_or(|max| product.price <= max);
        brand_ok && price_ok
    }
}

/// Products that pass `filter`, in catalog order.
#[must_use]
pub fn visible_products<'a>(products: &'a [Product], filter: &Filter) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

/// Products flagged as new arrivals.
#[must_use]
pub fn new_arrivals(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.new_arrival).collect()
}

/// Products flagged as best sellers.
#[must_use]
pub fn best_sellers(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.best_seller).collect()
}

/// Products listed under `category`.
#[must_use]
pub fn in_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.category == category).collect()
}

/// Other products from the same category as `product`.
#[must_use]
pub fn similar_products<'a>(products: &'a [Product], product: &Product) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.category == product.category && p.id != product.id)
        .collect()
}

/// Categories and per-category brands derived from a product list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogIndex {
    categories: Vec<String>,
    brands: HashMap<String, Vec<String>>,
}

impl CatalogIndex {
    /// Index `products`. Both categories and brands keep first-occurrence
    /// order.
    #[must_use]
    pub fn build(products: &[Product]) -> Self {
        let mut index = Self::default();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();

        for product in products {
            if !index.brands.contains_key(&product.category) {
                index.categories.push(product.category.clone());
            }
            let brands = index.brands.entry(product.category.clone()).or_default();
            if seen.insert((product.category.as_str(), product.brand.as_str())) {
                brands.push(product.brand.clone());
            }
        }

        index
    }

    /// Distinct categories.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Distinct brands within `category`; empty for unknown categories.
    #[must_use]
    pub fn brands_for(&self, category: &str) -> &[String] {
        self.brands.get(category).map_or(&[], Vec::as_slice)
    }

    /// Categories paired with their brands, in category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|c| (c.as_str(), self.brands_for(c)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn product(id: &str, category: &str, brand: &str, price: u32) -> Product {
        Product {
            id: ProductId::new(id),
            category: category.to_owned(),
            brand: brand.to_owned(),
            price: Price::from_whole(price),
            name: None,
            description: None,
            images: Vec::new(),
            new_arrival: false,
            best_seller: false,
        }
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Cool Drinks", "Pepsi", 100),
            product("2", "Cool Drinks", "Coke", 5000),
            product("3", "Wine", "Merlot", 900),
            product("4", "Cool Drinks", "Pepsi", 60),
            product("5", "Alcohol", "Corona", 12_000),
        ]
    }

    #[test]
    fn test_default_filter_caps_at_highest_tier() {
        let products = catalog();
        let visible = visible_products(&products, &Filter::default());
        assert_eq!(ids(&visible), ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_price_only_filter_preserves_order() {
        let filter = Filter::new(Vec::<String>::new(), Some(Price::from_whole(1000)));
        let products = catalog();
        let visible = visible_products(&products, &filter);
        assert_eq!(ids(&visible), ["1", "3", "4"]);
    }

    #[test]
    fn test_single_brand_unbounded_price() {
        let filter = Filter::new(["Pepsi"], None);
        let products = catalog();
        let visible = visible_products(&products, &filter);
        assert_eq!(ids(&visible), ["1", "4"]);
    }

    #[test]
    fn test_price_ceiling_is_inclusive() {
        let filter = Filter::new(["Coke"], Some(Price::from_whole(5000)));
        let products = catalog();
        assert_eq!(ids(&visible_products(&products, &filter)), ["2"]);
    }

    #[test]
    fn test_unknown_brand_shows_nothing() {
        let filter = Filter::new(["Sprite"], None);
        let products = catalog();
        assert!(visible_products(&products, &filter).is_empty());
    }

    #[test]
    fn test_toggle_brand() {
        let mut filter = Filter::default();
        assert!(filter.toggle_brand("Pepsi"));
        assert!(filter.toggle_brand("Coke"));
        assert!(!filter.toggle_brand("Pepsi"));
        assert_eq!(filter.selected_brands.len(), 1);
        assert!(filter.selected_brands.contains("Coke"));
    }

    #[test]
    fn test_set_price_tier_clamps() {
        let mut filter = Filter::unbounded();
        filter.set_price_tier(1);
        assert_eq!(filter.max_price, Some(Price::from_whole(1000)));
        filter.set_price_tier(42);
        assert_eq!(filter.max_price, Some(Price::from_whole(10_000)));
    }

    #[test]
    fn test_index_first_occurrence_order() {
        let products = catalog();
        let index = CatalogIndex::build(&products);

        assert_eq!(index.categories(), ["Cool Drinks", "Wine", "Alcohol"]);
        assert_eq!(index.brands_for("Cool Drinks"), ["Pepsi", "Coke"]);
        assert_eq!(index.brands_for("Wine"), ["Merlot"]);
        assert!(index.brands_for("Fruit Juice").is_empty());
    }

    #[test]
    fn test_same_brand_in_two_categories() {
        let products = vec![
            product("1", "Cool Drinks", "Tropicana", 80),
            product("2", "Fruit Juice", "Tropicana", 120),
        ];
        let index = CatalogIndex::build(&products);
        assert_eq!(index.brands_for("Cool Drinks"), ["Tropicana"]);
        assert_eq!(index.brands_for("Fruit Juice"), ["Tropicana"]);
    }

    #[test]
    fn test_index_empty_catalog() {
        let index = CatalogIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn test_views() {
        let mut products = catalog();
        products[0].new_arrival = true;
        products[2].best_seller = true;

        assert_eq!(ids(&new_arrivals(&products)), ["1"]);
        assert_eq!(ids(&best_sellers(&products)), ["3"]);
        assert_eq!(ids(&in_category(&products, "Cool Drinks")), ["1", "2", "4"]);
        assert_eq!(ids(&similar_products(&products, &products[0])), ["2", "4"]);
    }
}
