//! The cart store.
//!
//! [`CartStore`] starts [`CartState::Uninitialized`] and becomes
//! [`CartState::Ready`] exactly once, when [`CartStore::load`] finishes.
//! Mutations before that are rejected with [`CartError::NotReady`].
//!
//! Every mutation that changes the cart:
//! 1. Updates the in-memory [`Cart`]
//! 2. Queues the serialized snapshot on the [`PersistQueue`]
//! 3. Publishes the new snapshot to [`CartStore::subscribe`] receivers

use std::sync::Arc;

use go_marketplace_core::{Cart, DecrementPolicy, LineItem, NewLineItem};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::persist::PersistQueue;
use crate::storage::KeyValueStore;

/// Lifecycle of the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartState {
    /// Created, stored cart not read yet.
    Uninitialized,
    /// Loaded and accepting mutations.
    Ready(Cart),
}

/// In-memory cart synchronized with a key-value store.
pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    config: CartConfig,
    state: CartState,
    writer: PersistQueue,
    changes: watch::Sender<Vec<LineItem>>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an uninitialized store and start its persistence writer.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, config: CartConfig) -> Self {
        let writer = PersistQueue::spawn(Arc::clone(&storage), config.storage_key.clone());
        let (changes, _) = watch::channel(Vec::new());

        Self {
            storage,
            config,
            state: CartState::Uninitialized,
            writer,
            changes,
        }
    }

    /// Read the stored cart and move to the ready state.
    ///
    /// An absent key leaves the cart empty. A malformed value or a failed
    /// read is logged and also leaves the cart empty; startup never fails
    /// because of stored data. Calling this again once ready does nothing.
    #[instrument(skip(self), fields(key = %self.config.storage_key))]
    pub async fn load(&mut self) {
        if self.is_ready() {
            warn!("Cart already loaded, ignoring load");
            return;
        }

        let cart = match self.storage.get(&self.config.storage_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Cart>(&raw) {
                Ok(cart) => cart,
                Err(e) => {
                    warn!(error = %e, "Stored cart is malformed, starting with an empty cart");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) => {
                error!(error = %e, "Failed to read stored cart, starting with an empty cart");
                Cart::new()
            }
        };

        info!(items = cart.len(), "Cart loaded");
        self.changes.send_replace(cart.items().to_vec());
        self.state = CartState::Ready(cart);
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Whether [`load`](Self::load) has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, CartState::Ready(_))
    }

    /// Current line items in insertion order. Empty until loaded.
    #[must_use]
    pub fn products(&self) -> &[LineItem] {
        match &self.state {
            CartState::Ready(cart) => cart.items(),
            CartState::Uninitialized => &[],
        }
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        match &self.state {
            CartState::Ready(cart) => cart.total_quantity(),
            CartState::Uninitialized => 0,
        }
    }

    /// Add a product, or bump its quantity if it is already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the cart is loaded.
    pub fn add_to_cart(&mut self, item: NewLineItem) -> Result<()> {
        debug!(id = %item.id, "Adding to cart");
        self.mutate("add_to_cart", |cart, _| {
            cart.add(item);
            true
        })
    }

    /// Increase the quantity of `id` by one. No-op if `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the cart is loaded.
    pub fn increment(&mut self, id: &str) -> Result<()> {
        self.mutate("increment", |cart, _| cart.increment(id))
    }

    /// Decrease the quantity of `id` by one under the configured
    /// [`DecrementPolicy`]. No-op if `id` is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the cart is loaded.
    pub fn decrement(&mut self, id: &str) -> Result<()> {
        self.mutate("decrement", |cart, policy| cart.decrement(id, policy))
    }

    /// Empty the cart and delete the stored copy.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the cart is loaded.
    pub fn clear(&mut self) -> Result<()> {
        let CartState::Ready(cart) = &mut self.state else {
            warn!(operation = "clear", "Rejected cart mutation before load");
            return Err(CartError::NotReady);
        };

        cart.clear();
        self.writer.remove();
        self.changes.send_replace(Vec::new());
        Ok(())
    }

    /// Subscribe to cart snapshots.
    ///
    /// The receiver holds the latest snapshot and is marked changed after
    /// every mutation that altered the cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineItem>> {
        self.changes.subscribe()
    }

    /// The persistence queue this store writes through.
    #[must_use]
    pub const fn persist_queue(&self) -> &PersistQueue {
        &self.writer
    }

    /// Wait until every queued write has reached storage.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    fn mutate(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut Cart, DecrementPolicy) -> bool,
    ) -> Result<()> {
        let policy = self.config.decrement_policy;
        let CartState::Ready(cart) = &mut self.state else {
            warn!(operation, "Rejected cart mutation before load");
            return Err(CartError::NotReady);
        };

        if !apply(cart, policy) {
            debug!(operation, "Cart unchanged");
            return Ok(());
        }

        let serialized = serde_json::to_string(cart)?;
        self.writer.write(serialized);
        self.changes.send_replace(cart.items().to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use go_marketplace_core::{Price, ProductId};

    use super::*;
    use crate::storage::MemoryStore;

    fn product(id: &str) -> NewLineItem {
        NewLineItem::new(ProductId::parse(id).unwrap(), "T", "u", Price::from_cents(1000))
    }

    async fn stored_cart(storage: &MemoryStore, key: &str) -> Option<Cart> {
        storage
            .get(key)
            .await
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    async fn loaded_store(storage: Arc<MemoryStore>, config: CartConfig) -> CartStore {
        let mut store = CartStore::new(storage, config);
        store.load().await;
        store
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[tokio::test]
    async fn test_load_absent_key_yields_empty_ready_cart() {
        let store = loaded_store(Arc::new(MemoryStore::new()), CartConfig::default()).await;

        assert!(store.is_ready());
        assert_eq!(store.state(), &CartState::Ready(Cart::new()));
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_load_restores_stored_cart() {
        let json = r#"[{"id":"a","title":"T","image_url":"u","price":10,"quantity":3}]"#;
        let storage = Arc::new(MemoryStore::with_entry("@GoMarketplace:products", json));
        let store = loaded_store(storage, CartConfig::default()).await;

        assert_eq!(store.products().len(), 1);
        assert_eq!(store.products()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_load_malformed_value_yields_empty_ready_cart() {
        let storage = Arc::new(MemoryStore::with_entry("@GoMarketplace:products", "{oops"));
        let store = loaded_store(storage, CartConfig::default()).await;

        assert!(store.is_ready());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_items_without_id() {
        let json = r#"[{"id":"","title":"T","image_url":"u","price":10,"quantity":1}]"#;
        let storage = Arc::new(MemoryStore::with_entry("@GoMarketplace:products", json));
        let store = loaded_store(storage, CartConfig::default()).await;

        assert!(store.is_ready());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_load_overflowing_duplicates_yields_empty_ready_cart() {
        let json = format!(
            r#"[{{"id":"a","title":"T","image_url":"u","price":10,"quantity":{}}},
                {{"id":"a","title":"T","image_url":"u","price":10,"quantity":1}}]"#,
            i64::MAX
        );
        let storage = Arc::new(MemoryStore::with_entry("@GoMarketplace:products", json));
        let store = loaded_store(storage, CartConfig::default()).await;

        assert!(store.is_ready());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_load_out_of_range_price_yields_empty_ready_cart() {
        let json = r#"[{"id":"a","title":"T","image_url":"u","price":1e300,"quantity":1}]"#;
        let storage = Arc::new(MemoryStore::with_entry("@GoMarketplace:products", json));
        let store = loaded_store(storage, CartConfig::default()).await;

        assert!(store.is_ready());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_edge_price_survives_reload() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = loaded_store(storage.clone(), CartConfig::default()).await;
        let amount = "99999999999.9999".parse().unwrap();
        store
            .add_to_cart(NewLineItem::new(
                ProductId::parse("a").unwrap(),
                "T",
                "u",
                Price::new(amount).unwrap(),
            ))
            .unwrap();
        store.flush().await;

        let reloaded = loaded_store(storage, CartConfig::default()).await;
        assert_eq!(reloaded.products(), store.products());
        assert_eq!(reloaded.products()[0].price.amount(), amount);
    }

    #[tokio::test]
    async fn test_mutations_before_load_are_rejected() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = CartStore::new(storage.clone(), CartConfig::default());

        assert!(matches!(store.add_to_cart(product("a")), Err(CartError::NotReady)));
        assert!(matches!(store.increment("a"), Err(CartError::NotReady)));
        assert!(matches!(store.decrement("a"), Err(CartError::NotReady)));
        assert!(matches!(store.clear(), Err(CartError::NotReady)));

        store.flush().await;
        assert_eq!(storage.get("@GoMarketplace:products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_load_is_ignored() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = loaded_store(storage.clone(), CartConfig::default()).await;
        store.add_to_cart(product("a")).unwrap();

        storage.set("@GoMarketplace:products", "[]").await.unwrap();
        store.load().await;

        assert_eq!(store.products().len(), 1);
    }

    // =========================================================================
    // Mutations and persistence
    // =========================================================================

    #[tokio::test]
    async fn test_add_to_cart_persists() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = loaded_store(storage.clone(), CartConfig::default()).await;

        store.add_to_cart(product("a")).unwrap();
        store.add_to_cart(product("a")).unwrap();
        store.flush().await;

        let stored = stored_cart(&storage, "@GoMarketplace:products").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.items()[0].quantity, 2);
        assert_eq!(store.total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_rapid_mutations_persist_final_state() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = loaded_store(storage.clone(), CartConfig::default()).await;

        for id in ["a", "b", "c", "a"] {
            store.add_to_cart(product(id)).unwrap();
        }
        for _ in 0..10 {
            store.increment("b").unwrap();
        }
        store.decrement("c").unwrap();
        store.flush().await;

        let stored = stored_cart(&storage, "@GoMarketplace:products").await.unwrap();
        assert_eq!(stored.items(), store.products());
        assert_eq!(stored.get("b").unwrap().quantity, 11);
        assert_eq!(stored.get("c").unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_noop_does_not_write() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = loaded_store(storage.clone(), CartConfig::default()).await;

        store.increment("missing").unwrap();
        store.decrement("missing").unwrap();
        store.flush().await;

        assert_eq!(storage.get("@GoMarketplace:products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_decrement_follows_configured_policy() {
        let config = CartConfig::default().with_decrement_policy(DecrementPolicy::Remove);
        let mut store = loaded_store(Arc::new(MemoryStore::new()), config).await;

        store.add_to_cart(product("a")).unwrap();
        store.decrement("a").unwrap();

        assert!(store.products().is_empty());
    }

    /// Known defect kept by the default policy: quantities go below zero.
    #[tokio::test]
    async fn test_default_policy_allows_negative_quantity() {
        let mut store = loaded_store(Arc::new(MemoryStore::new()), CartConfig::default()).await;

        store.add_to_cart(product("a")).unwrap();
        store.decrement("a").unwrap();
        store.decrement("a").unwrap();

        assert_eq!(store.products()[0].quantity, -1);
    }

    #[tokio::test]
    async fn test_clear_removes_stored_cart() {
        let storage = Arc::new(MemoryStore::new());
        let mut store = loaded_store(storage.clone(), CartConfig::default()).await;

        store.add_to_cart(product("a")).unwrap();
        store.clear().unwrap();
        store.flush().await;

        assert!(store.products().is_empty());
        assert_eq!(storage.get("@GoMarketplace:products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_custom_storage_key() {
        let storage = Arc::new(MemoryStore::new());
        let config = CartConfig {
            storage_key: "@Test:cart".to_string(),
            ..CartConfig::default()
        };
        let mut store = loaded_store(storage.clone(), config).await;

        store.add_to_cart(product("a")).unwrap();
        store.flush().await;

        assert!(storage.get("@Test:cart").await.unwrap().is_some());
        assert_eq!(storage.get("@GoMarketplace:products").await.unwrap(), None);
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let mut store = loaded_store(Arc::new(MemoryStore::new()), CartConfig::default()).await;
        let mut rx = store.subscribe();

        store.add_to_cart(product("a")).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.increment("missing").unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}
