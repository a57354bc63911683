//! Shopaholic Storefront library.
//!
//! Client-side state for the Shopaholic shop: persisted carts, cross-tab
//! synchronization, the catalog filter and the backend API client. The
//! `shop` CLI and the integration tests are built on this crate.
//!
//! # Modules
//!
//! - [`storage`] - Key/value storage with change notifications
//! - [`cart_store`] - Per-scope persisted carts
//! - [`sync`] - Cross-tab change listener
//! - [`session`] - [`StorefrontSession`], the per-tab state owner
//! - [`admin`] - Admin-maintained category and brand options
//! - [`api`] - HTTP client for the backend
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod cart_store;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod sync;

pub use error::SessionError;
pub use session::{ChangeSource, SessionEvent, StorefrontSession};
