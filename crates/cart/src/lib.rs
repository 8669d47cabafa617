//! GoMarketplace Cart - Persistent shopping-cart state.
//!
//! Holds the cart in memory, persists it to a key-value store after every
//! mutation, and hands it to UI code through a provider scope.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the [`Cart`](go_marketplace_core::Cart) and its
//!   uninitialized/ready lifecycle
//! - [`PersistQueue`] is the single writer to storage; every snapshot is
//!   applied in order, so storage always ends at the last committed cart
//! - [`CartProvider`] loads the store and hands out [`CartContext`] handles,
//!   the capability bundle the UI layer consumes
//! - [`storage`] defines the [`KeyValueStore`] trait with in-memory and
//!   file-backed implementations
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use go_marketplace_cart::{CartConfig, CartProvider, MemoryStore};
//! use go_marketplace_core::{NewLineItem, Price, ProductId};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CartProvider::mount(Arc::new(MemoryStore::new()), CartConfig::default()).await;
//! let cart = provider.context();
//!
//! cart.add_to_cart(NewLineItem::new(
//!     ProductId::parse("1")?,
//!     "Cadeira Rivatti",
//!     "https://example.com/1.png",
//!     Price::from_cents(40000),
//! ))?;
//! assert_eq!(cart.products()?.len(), 1);
//!
//! provider.unmount().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod persist;
pub mod provider;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY};
pub use error::{CartError, Result};
pub use persist::PersistQueue;
pub use provider::{CartContext, CartProvider, use_cart};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartState, CartStore};
