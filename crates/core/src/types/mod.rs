//! Core types for GoMarketplace.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod cart;
pub mod id;
pub mod line_item;
pub mod price;

pub use cart::{Cart, CartDataError, DecrementPolicy, DecrementPolicyError};
pub use id::{ProductId, ProductIdError};
pub use line_item::{LineItem, NewLineItem};
pub use price::{Price, PriceError};
