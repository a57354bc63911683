//! Session-level error type.
//!
//! Storage and API failures surface through [`SessionError`]; everything
//! the session can recover from locally (malformed data, missing lines,
//! catalog fetch failures) is logged instead.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors returned by [`crate::session::StorefrontSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Persisting state failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The backend declined the payment; carries its message verbatim.
    #[error("Payment failed: {0}")]
    Payment(String),

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
