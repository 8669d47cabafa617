//! GoMarketplace Core - Shared cart types.
//!
//! This crate provides the data model used by every GoMarketplace component:
//! - `cart` - Cart store, persistence queue and provider scope
//! - `cli` - Command-line tool for inspecting and editing a stored cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart logic - no I/O, no async
//! runtime, no storage access. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, line items and the ordered [`Cart`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
