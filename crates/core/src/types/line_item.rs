//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as offered to the cart, before it has a quantity.
///
/// This is what the catalog UI hands to `add_to_cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

impl NewLineItem {
    /// Create a new line item descriptor.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One product entry in the cart with its quantity.
///
/// Serialized as a flat record:
/// `{"id": "...", "title": "...", "image_url": "...", "price": 10, "quantity": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    /// Signed so that the unbounded decrement policy can represent the
    /// below-zero quantities existing persisted carts may already contain.
    pub quantity: i64,
}

impl LineItem {
    /// Create a line item from a descriptor with an initial quantity.
    #[must_use]
    pub fn with_quantity(item: NewLineItem, quantity: i64) -> Self {
        Self {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity,
        }
    }
}

impl From<NewLineItem> for LineItem {
    fn from(item: NewLineItem) -> Self {
        Self::with_quantity(item, 1)
    }
}
