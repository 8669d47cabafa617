//! Cart commands.
//!
//! Each command runs against a [`CartContext`] from a freshly mounted
//! provider; the caller unmounts it afterwards so queued writes are flushed.

use go_marketplace_cart::{CartContext, CartError};
use go_marketplace_core::{NewLineItem, Price, PriceError, ProductId, ProductIdError};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The product ID given on the command line is invalid.
    #[error("Invalid product id: {0}")]
    InvalidProductId(#[from] ProductIdError),

    /// The price given on the command line cannot be stored exactly.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// The cart rejected the operation.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

/// Print the cart contents.
///
/// # Errors
///
/// Returns an error if the cart cannot be read.
#[allow(clippy::print_stdout)]
pub fn list(cart: &CartContext) -> Result<(), CommandError> {
    let products = cart.products()?;
    if products.is_empty() {
        println!("Cart is empty");
        return Ok(());
    }

    for item in &products {
        println!(
            "{:>4} x {:<32} {:>10}  [{}]",
            item.quantity,
            item.title,
            item.price.to_string(),
            item.id
        );
    }
    println!("{} item(s)", cart.total_quantity()?);
    Ok(())
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the product ID is empty or the price has more
/// precision than storage keeps.
pub fn add(
    cart: &CartContext,
    id: &str,
    title: String,
    image_url: String,
    price: Decimal,
) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    let price = Price::new(price)?;
    cart.add_to_cart(NewLineItem::new(id.clone(), title, image_url, price))?;

    let quantity = quantity_of(cart, id.as_str())?.unwrap_or_default();
    info!(id = %id, quantity, "Added to cart");
    Ok(())
}

/// Increase a product's quantity.
///
/// # Errors
///
/// Returns an error if the cart rejects the operation.
pub fn increment(cart: &CartContext, id: &str) -> Result<(), CommandError> {
    if quantity_of(cart, id)?.is_none() {
        warn!(id, "Product is not in the cart");
        return Ok(());
    }
    cart.increment(id)?;
    report(cart, id, "Incremented")
}

/// Decrease a product's quantity.
///
/// # Errors
///
/// Returns an error if the cart rejects the operation.
pub fn decrement(cart: &CartContext, id: &str) -> Result<(), CommandError> {
    if quantity_of(cart, id)?.is_none() {
        warn!(id, "Product is not in the cart");
        return Ok(());
    }
    cart.decrement(id)?;
    report(cart, id, "Decremented")
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart rejects the operation.
pub fn clear(cart: &CartContext) -> Result<(), CommandError> {
    cart.clear()?;
    info!("Cart cleared");
    Ok(())
}

fn quantity_of(cart: &CartContext, id: &str) -> Result<Option<i64>, CommandError> {
    Ok(cart
        .products()?
        .iter()
        .find(|item| item.id == *id)
        .map(|item| item.quantity))
}

fn report(cart: &CartContext, id: &str, action: &str) -> Result<(), CommandError> {
    match quantity_of(cart, id)? {
        Some(quantity) => info!(id, quantity, "{action}"),
        None => info!(id, "Removed from cart"),
    }
    Ok(())
}
