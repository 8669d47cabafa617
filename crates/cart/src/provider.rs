//! Provider scope for UI consumers.
//!
//! A [`CartProvider`] owns the loaded [`CartStore`] for as long as the view
//! tree that needs the cart is mounted. Components receive a [`CartContext`]
//! from it (explicitly, not through a global) and call the cart operations on
//! that handle. Contexts hold only a weak reference: once the provider is
//! gone, every operation fails with [`CartError::NoProvider`].

use std::sync::{Arc, RwLock, Weak};

use go_marketplace_core::{LineItem, NewLineItem};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::persist::PersistQueue;
use crate::storage::KeyValueStore;
use crate::store::CartStore;

/// Owner of the cart for the lifetime of a UI subtree.
#[derive(Debug)]
pub struct CartProvider {
    store: Arc<RwLock<CartStore>>,
    writer: PersistQueue,
}

impl CartProvider {
    /// Create the store, load the stored cart and start serving contexts.
    ///
    /// The returned provider is always ready; stored data that cannot be
    /// read results in an empty cart.
    #[instrument(skip_all, fields(key = %config.storage_key))]
    pub async fn mount(storage: Arc<dyn KeyValueStore>, config: CartConfig) -> Self {
        let mut store = CartStore::new(storage, config);
        store.load().await;
        let writer = store.persist_queue().clone();

        debug!("Cart provider mounted");
        Self {
            store: Arc::new(RwLock::new(store)),
            writer,
        }
    }

    /// Hand out a cart handle for a component.
    #[must_use]
    pub fn context(&self) -> CartContext {
        CartContext {
            store: Arc::downgrade(&self.store),
            writer: self.writer.clone(),
        }
    }

    /// Tear down the provider after every pending write reached storage.
    pub async fn unmount(self) {
        self.writer.flush().await;
        debug!("Cart provider unmounted");
    }
}

/// Resolve the cart for a component.
///
/// # Errors
///
/// Returns `CartError::NoProvider` when no provider is in scope.
pub fn use_cart(provider: Option<&CartProvider>) -> Result<CartContext> {
    provider.map(CartProvider::context).ok_or(CartError::NoProvider)
}

/// Handle to the cart operations exposed to UI code.
///
/// Cheap to clone. Each operation takes the store lock briefly and never
/// across an `.await`.
#[derive(Debug, Clone)]
pub struct CartContext {
    store: Weak<RwLock<CartStore>>,
    writer: PersistQueue,
}

impl CartContext {
    fn with_read<T>(&self, f: impl FnOnce(&CartStore) -> T) -> Result<T> {
        let store = self.store.upgrade().ok_or(CartError::NoProvider)?;
        let guard = store.read().map_err(|_| CartError::LockPoisoned)?;
        Ok(f(&*guard))
    }

    fn with_write<T>(&self, f: impl FnOnce(&mut CartStore) -> Result<T>) -> Result<T> {
        let store = self.store.upgrade().ok_or(CartError::NoProvider)?;
        let mut guard = store.write().map_err(|_| CartError::LockPoisoned)?;
        f(&mut *guard)
    }

    /// Current cart snapshot in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn products(&self) -> Result<Vec<LineItem>> {
        self.with_read(|store| store.products().to_vec())
    }

    /// Sum of all line quantities, for the cart badge.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn total_quantity(&self) -> Result<i64> {
        self.with_read(CartStore::total_quantity)
    }

    /// See [`CartStore::add_to_cart`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn add_to_cart(&self, item: NewLineItem) -> Result<()> {
        self.with_write(|store| store.add_to_cart(item))
    }

    /// See [`CartStore::increment`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn increment(&self, id: &str) -> Result<()> {
        self.with_write(|store| store.increment(id))
    }

    /// See [`CartStore::decrement`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn decrement(&self, id: &str) -> Result<()> {
        self.with_write(|store| store.decrement(id))
    }

    /// See [`CartStore::clear`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn clear(&self) -> Result<()> {
        self.with_write(CartStore::clear)
    }

    /// Receive a new snapshot whenever the cart changes.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoProvider` if the provider has been dropped.
    pub fn subscribe(&self) -> Result<watch::Receiver<Vec<LineItem>>> {
        self.with_read(CartStore::subscribe)
    }

    /// Wait until every write queued so far has reached storage.
    ///
    /// Works after the provider is gone too, since queued writes are still
    /// applied then.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}
