//! Shopaholic Core - Shared types and storefront logic.
//!
//! This crate provides the domain model used across all Shopaholic
//! components:
//! - `storefront` - Client-side session: persisted carts, cross-tab sync, API client
//! - `cli` - Command-line front end for browsing, cart and admin tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage access, no HTTP clients. Cart arithmetic, catalog filtering and
//! checkout totals all live here so they can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and emails
//! - [`product`] - Catalog products and admin drafts
//! - [`user`] - Logged-in shopper profile
//! - [`cart`] - Cart lines and quantity operations
//! - [`catalog`] - Brand/price filter, category index, catalog views
//! - [`checkout`] - Totals, GST, coupons, payment methods

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod product;
pub mod types;
pub mod user;

pub use cart::{Cart, CartLine};
pub use catalog::{CatalogIndex, Filter, PRICE_TIERS, visible_products};
pub use checkout::{Coupon, PaymentMethod, TAX_RATE, Totals};
pub use product::{Product, ProductDraft};
pub use types::*;
pub use user::User;
