//! Cart error handling.
//!
//! Storage failures never surface here: reads fall back to an empty cart and
//! writes are logged by the persistence queue. What remains are contract
//! violations by the calling code.

use thiserror::Error;

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart was accessed outside of a mounted [`CartProvider`](crate::CartProvider).
    #[error("cart used without a CartProvider")]
    NoProvider,

    /// A mutation was attempted before the stored cart finished loading.
    #[error("cart is not loaded yet")]
    NotReady,

    /// The lock guarding the store was poisoned by a panicking holder.
    #[error("cart lock poisoned")]
    LockPoisoned,

    /// The cart could not be serialized for persistence.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
