//! The ordered, id-unique cart.
//!
//! [`Cart`] holds the pure list logic. Persistence and change notification
//! live in the `go-marketplace-cart` crate, which wraps a `Cart` in its store.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{LineItem, NewLineItem, ProductId};

/// Errors that can occur when parsing a [`DecrementPolicy`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown decrement policy '{0}' (expected unbounded, floor or remove)")]
pub struct DecrementPolicyError(pub String);

/// Errors that can occur when building a [`Cart`] from stored line items.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartDataError {
    /// Merging repeated entries for one ID overflowed its quantity.
    #[error("quantity of product '{0}' overflows when merging duplicate entries")]
    QuantityOverflow(ProductId),
}

/// What `decrement` does once a quantity reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecrementPolicy {
    /// No floor: quantity keeps going down, below zero if asked to.
    #[default]
    Unbounded,
    /// Quantity stops at zero and the item stays in the cart.
    Floor,
    /// An item whose quantity reaches zero is removed from the cart.
    Remove,
}

impl DecrementPolicy {
    /// Returns the configuration name of this policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unbounded => "unbounded",
            Self::Floor => "floor",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for DecrementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DecrementPolicy {
    type Err = DecrementPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unbounded" => Ok(Self::Unbounded),
            "floor" => Ok(Self::Floor),
            "remove" => Ok(Self::Remove),
            _ => Err(DecrementPolicyError(s.to_string())),
        }
    }
}

/// An ordered sequence of line items, at most one per product ID.
///
/// Items keep the position at which their ID was first added. Serializes as
/// a plain JSON array of [`LineItem`] records; duplicate IDs in stored data
/// are merged on the way in.
///
/// Quantity changes saturate at the `i64` bounds instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from persisted line items.
    ///
    /// If the input repeats an ID, later entries are merged into the first
    /// one by summing quantities, so the uniqueness invariant holds.
    ///
    /// # Errors
    ///
    /// Returns [`CartDataError::QuantityOverflow`] if a merged quantity does
    /// not fit in an `i64`.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, CartDataError> {
        let mut cart = Self::new();
        for item in items {
            match cart.items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or(CartDataError::QuantityOverflow(item.id))?;
                }
                None => cart.items.push(item),
            }
        }
        Ok(cart)
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line item by product ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0_i64, |total, item| total.saturating_add(item.quantity))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == *id)
    }

    /// Add a product to the cart.
    ///
    /// A new ID is appended with quantity 1. A known ID has its quantity
    /// bumped by one in place; the stored title, image and price are kept.
    pub fn add(&mut self, item: NewLineItem) {
        match self.position(item.id.as_str()) {
            Some(index) => {
                if let Some(existing) = self.items.get_mut(index) {
                    existing.quantity = existing.quantity.saturating_add(1);
                }
            }
            None => self.items.push(LineItem::from(item)),
        }
    }

    /// Increase the quantity of `id` by one.
    ///
    /// Returns `false` if the ID is not in the cart.
    pub fn increment(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|item| item.id == *id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Decrease the quantity of `id` by one according to `policy`.
    ///
    /// Returns `true` if the cart changed. Under [`DecrementPolicy::Floor`] a
    /// line already at zero is left alone and this returns `false`.
    pub fn decrement(&mut self, id: &str, policy: DecrementPolicy) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };

        match policy {
            DecrementPolicy::Unbounded => {
                item.quantity = item.quantity.saturating_sub(1);
                true
            }
            DecrementPolicy::Floor => {
                if item.quantity <= 0 {
                    return false;
                }
                item.quantity -= 1;
                true
            }
            DecrementPolicy::Remove => {
                item.quantity = item.quantity.saturating_sub(1);
                if item.quantity <= 0 {
                    self.items.remove(index);
                }
                true
            }
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CartDataError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn product(id: &str) -> NewLineItem {
        NewLineItem::new(ProductId::parse(id).unwrap(), "T", "u", Price::from_cents(1000))
    }

    fn ids(cart: &Cart) -> Vec<&str> {
        cart.items().iter().map(|item| item.id.as_str()).collect()
    }

    // =========================================================================
    // add
    // =========================================================================

    #[test]
    fn test_add_to_empty_cart() {
        let mut cart = Cart::new();
        cart.add(product("a"));

        assert_eq!(cart.len(), 1);
        let line = &cart.items()[0];
        assert_eq!(line.id.as_str(), "a");
        assert_eq!(line.title, "T");
        assert_eq!(line.image_url, "u");
        assert_eq!(line.price, Price::from_cents(1000));
        assert_eq!(line.quantity, 1);
    }

    #[test]
    fn test_add_same_id_twice_keeps_single_entry() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.add(product("a"));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_add_distinct_ids_in_first_seen_order() {
        let mut cart = Cart::new();
        for id in ["c", "a", "b", "a", "c"] {
            cart.add(product(id));
        }

        assert_eq!(ids(&cart), vec!["c", "a", "b"]);
        assert_eq!(cart.get("c").unwrap().quantity, 2);
        assert_eq!(cart.get("a").unwrap().quantity, 2);
        assert_eq!(cart.get("b").unwrap().quantity, 1);
    }

    #[test]
    fn test_re_add_preserves_position_and_fields() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.add(product("b"));

        let mut changed = product("a");
        changed.title = "Renamed".to_string();
        changed.price = Price::from_cents(1);
        cart.add(changed);

        assert_eq!(ids(&cart), vec!["a", "b"]);
        let line = cart.get("a").unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.title, "T");
        assert_eq!(line.price, Price::from_cents(1000));
    }

    // =========================================================================
    // increment / decrement
    // =========================================================================

    #[test]
    fn test_increment_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        let before = cart.clone();

        assert!(!cart.increment("missing"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_increment_present() {
        let mut cart = Cart::new();
        cart.add(product("a"));

        assert!(cart.increment("a"));
        assert_eq!(cart.get("a").unwrap().quantity, 2);
    }

    #[test]
    fn test_decrement_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        let before = cart.clone();

        assert!(!cart.decrement("missing", DecrementPolicy::Unbounded));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_decrement_one_to_zero() {
        for policy in [DecrementPolicy::Unbounded, DecrementPolicy::Floor] {
            let mut cart = Cart::new();
            cart.add(product("a"));

            assert!(cart.decrement("a", policy));
            assert_eq!(cart.get("a").unwrap().quantity, 0, "policy {policy}");
        }
    }

    /// Known defect carried by the unbounded policy: quantities go negative.
    #[test]
    fn test_decrement_unbounded_goes_negative() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.decrement("a", DecrementPolicy::Unbounded);
        cart.decrement("a", DecrementPolicy::Unbounded);

        assert_eq!(cart.get("a").unwrap().quantity, -1);
    }

    #[test]
    fn test_decrement_floor_stops_at_zero() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.decrement("a", DecrementPolicy::Floor);

        assert!(!cart.decrement("a", DecrementPolicy::Floor));
        assert_eq!(cart.get("a").unwrap().quantity, 0);
    }

    #[test]
    fn test_decrement_remove_drops_item_at_zero() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.add(product("b"));
        cart.add(product("b"));

        assert!(cart.decrement("a", DecrementPolicy::Remove));
        assert!(cart.decrement("b", DecrementPolicy::Remove));

        assert_eq!(ids(&cart), vec!["b"]);
        assert_eq!(cart.get("b").unwrap().quantity, 1);
    }

    #[test]
    fn test_total_quantity() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.add(product("a"));
        cart.add(product("b"));

        assert_eq!(cart.total_quantity(), 3);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn test_serialization_round_trip() {
        let mut cart = Cart::new();
        cart.add(product("a"));
        cart.add(NewLineItem::new(
            ProductId::parse("b").unwrap(),
            "Banana",
            "https://img.example/b.png",
            Price::from_cents(1999),
        ));
        cart.increment("b");
        cart.decrement("a", DecrementPolicy::Unbounded);
        cart.decrement("a", DecrementPolicy::Unbounded);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_deserialize_stored_array() {
        let json = r#"[
            {"id":"1","title":"Cadeira","image_url":"https://x/1.png","price":400,"quantity":2},
            {"id":"2","title":"Poltrona","image_url":"https://x/2.png","price":1200.5,"quantity":1}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(ids(&cart), vec!["1", "2"]);
        assert_eq!(cart.get("2").unwrap().price.to_string(), "$1200.50");
    }

    #[test]
    fn test_from_items_merges_duplicate_ids() {
        let mut first = LineItem::from(product("a"));
        first.quantity = 2;
        let second = LineItem::from(product("a"));

        let cart = Cart::from_items(vec![first, second, LineItem::from(product("b"))]).unwrap();

        assert_eq!(ids(&cart), vec!["a", "b"]);
        assert_eq!(cart.get("a").unwrap().quantity, 3);
    }

    #[test]
    fn test_from_items_rejects_quantity_overflow() {
        let first = LineItem::with_quantity(product("a"), i64::MAX);
        let second = LineItem::from(product("a"));

        let err = Cart::from_items(vec![first, second]).unwrap_err();
        assert_eq!(err, CartDataError::QuantityOverflow(ProductId::parse("a").unwrap()));
    }

    #[test]
    fn test_deserialize_overflowing_duplicates_is_an_error() {
        let json = format!(
            r#"[
            {{"id":"a","title":"T","image_url":"u","price":10,"quantity":{}}},
            {{"id":"a","title":"T","image_url":"u","price":10,"quantity":1}}
        ]"#,
            i64::MAX
        );

        assert!(serde_json::from_str::<Cart>(&json).is_err());
    }

    #[test]
    fn test_quantities_saturate_at_bounds() {
        let mut cart = Cart::from_items(vec![
            LineItem::with_quantity(product("a"), i64::MAX),
            LineItem::with_quantity(product("b"), i64::MIN),
        ])
        .unwrap();

        cart.add(product("a"));
        assert!(cart.increment("a"));
        assert_eq!(cart.get("a").unwrap().quantity, i64::MAX);

        assert!(cart.decrement("b", DecrementPolicy::Unbounded));
        assert_eq!(cart.get("b").unwrap().quantity, i64::MIN);
    }

    #[test]
    fn test_total_quantity_saturates() {
        let mut cart = Cart::from_items(vec![LineItem::with_quantity(product("a"), i64::MAX)])
            .unwrap();
        cart.add(product("b"));

        assert_eq!(cart.total_quantity(), i64::MAX);
    }

    #[test]
    fn test_decrement_policy_parse() {
        assert_eq!("unbounded".parse(), Ok(DecrementPolicy::Unbounded));
        assert_eq!(" Floor ".parse(), Ok(DecrementPolicy::Floor));
        assert_eq!("REMOVE".parse(), Ok(DecrementPolicy::Remove));
        assert!("clamp".parse::<DecrementPolicy>().is_err());
    }
}
