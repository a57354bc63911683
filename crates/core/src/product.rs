//! Catalog product as served by the backend.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A product in the catalog.
///
/// Owned by the backend and read-only to the storefront. Field names follow
/// the backend's JSON (`_id`, `newArrival`, `bestSeller`); unknown fields
/// such as timestamps are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend-issued identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    /// Category the product is listed under (e.g. "Cool Drinks").
    pub category: String,
    /// Brand name; also used as the display title when `name` is absent.
    pub brand: String,
    /// Unit price.
    pub price: Price,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Flagged by the admin as a new arrival.
    #[serde(default)]
    pub new_arrival: bool,
    /// Flagged by the admin as a best seller.
    #[serde(default)]
    pub best_seller: bool,
}

impl Product {
    /// Title shown to shoppers: the product name, or the brand if unnamed.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.brand)
    }

    /// First image URL, if the product has any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Fields submitted when an admin creates or edits a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub category: String,
    pub brand: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub new_arrival: bool,
    #[serde(default)]
    pub best_seller: bool,
}

impl ProductDraft {
    /// Drop blank image URLs and trim the rest.
    ///
    /// The admin form always carries one empty image slot, so drafts are
    /// cleaned before they are submitted.
    #[must_use]
    pub fn cleaned(mut self) -> Self {
        self.images = self
            .images
            .into_iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();
        self.description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        self
    }
}
