//! Admin-maintained category and brand options.
//!
//! Kept in storage under `categories` (a list) and `brandOptions` (brands
//! per category). These drive the admin product form and are independent
//! of the cart and filter.

use std::collections::HashMap;

use crate::storage::{self, Storage, TabId, keys};

/// Categories the admin starts with, each with its default brands.
const DEFAULT_OPTIONS: &[(&str, &[&str])] = &[
    ("Cool Drinks", &["Coca Cola", "Pepsi", "Sprite"]),
    ("Alcohol", &["Heineken", "Budweiser", "Corona"]),
    ("Wine", &["Merlot", "Chardonnay", "Cabernet Sauvignon"]),
    ("Fruit Juice", &["Tropicana", "Minute Maid", "Real"]),
];

/// Category list plus brands per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCatalogOptions {
    categories: Vec<String>,
    brands: HashMap<String, Vec<String>>,
}

impl Default for AdminCatalogOptions {
    fn default() -> Self {
        let categories = DEFAULT_OPTIONS
            .iter()
            .map(|(category, _)| (*category).to_owned())
            .collect();
        let brands = DEFAULT_OPTIONS
            .iter()
            .map(|(category, brands)| {
                (
                    (*category).to_owned(),
                    brands.iter().map(|b| (*b).to_owned()).collect(),
                )
            })
            .collect();
        Self { categories, brands }
    }
}

impl AdminCatalogOptions {
    /// Load persisted options; each entry that is missing or malformed
    /// falls back to its default.
    #[must_use]
    pub fn load(storage: &dyn Storage) -> Self {
        let defaults = Self::default();
        Self {
            categories: storage::read_json(storage, keys::CATEGORIES)
                .unwrap_or(defaults.categories),
            brands: storage::read_json(storage, keys::BRAND_OPTIONS).unwrap_or(defaults.brands),
        }
    }

    /// Persist both entries.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry could not be written.
    pub fn save(&self, storage: &dyn Storage, tab: TabId) -> storage::Result<()> {
        storage::write_json(storage, keys::CATEGORIES, &self.categories, tab)?;
        storage::write_json(storage, keys::BRAND_OPTIONS, &self.brands, tab)
    }

    /// Categories in the order they were added.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Brands of `category`; empty for an unknown category.
    #[must_use]
    pub fn brands_for(&self, category: &str) -> &[String] {
        self.brands.get(category).map_or(&[], Vec::as_slice)
    }

    /// Add a category with no brands.
    ///
    /// Returns `false` if the trimmed name is blank or already present.
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.categories.iter().any(|c| c == name) {
            return false;
        }
        self.categories.push(name.to_owned());
        self.brands.insert(name.to_owned(), Vec::new());
        true
    }

    /// Delete a category together with its brands. The name is trimmed.
    ///
    /// Returns `false` if it did not exist.
    pub fn delete_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.categories.len();
        self.categories.retain(|c| c != name);
        let removed_brands = self.brands.remove(name).is_some();
        before != self.categories.len() || removed_brands
    }

    /// Add a brand to an existing category.
    ///
    /// Returns `false` if the category is unknown, or the trimmed brand is
    /// blank or already listed.
    pub fn add_brand(&mut self, category: &str, brand: &str) -> bool {
        let category = category.trim();
        let brand = brand.trim();
        if brand.is_empty() || !self.categories.iter().any(|c| c == category) {
            return false;
        }
        let brands = self.brands.entry(category.to_owned()).or_default();
        if brands.iter().any(|b| b == brand) {
            return false;
        }
        brands.push(brand.to_owned());
        true
    }

    /// Remove a brand from a category. Both names are trimmed.
    ///
    /// Returns `false` if it was not listed.
    pub fn delete_brand(&mut self, category: &str, brand: &str) -> bool {
        let brand = brand.trim();
        let Some(brands) = self.brands.get_mut(category.trim()) else {
            return false;
        };
        let before = brands.len();
        brands.retain(|b| b != brand);
        before != brands.len()
    }
}
