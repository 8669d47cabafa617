//! Integration tests for GoMarketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart state surviving restarts through the file store
//! - `cart_provider` - Provider scope and context behavior across components
//!
//! This library holds the fixtures shared by the test files.

use std::path::Path;
use std::sync::Arc;

use go_marketplace_cart::{CartConfig, CartProvider, FileStore};
use go_marketplace_core::{DecrementPolicy, NewLineItem, Price, ProductId, ProductIdError};

/// Build a catalog product for tests.
///
/// # Errors
///
/// Returns an error if `id` is empty.
pub fn sample_product(id: &str, title: &str, cents: u32) -> Result<NewLineItem, ProductIdError> {
    Ok(NewLineItem::new(
        ProductId::parse(id)?,
        title,
        format!("https://images.example.com/{id}.png"),
        Price::from_cents(cents),
    ))
}

/// Mount a provider backed by a storage file at `path`.
pub async fn mount_file_provider(path: &Path, policy: DecrementPolicy) -> CartProvider {
    let config = CartConfig::default()
        .with_storage_path(path)
        .with_decrement_policy(policy);
    let storage = Arc::new(FileStore::new(path));
    CartProvider::mount(storage, config).await
}
