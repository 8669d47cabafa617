//! Type-safe price representation using decimal arithmetic.
//!
//! Prices travel through storage as plain JSON numbers (`"price": 19.99`),
//! which every reader treats as an `f64`. A [`Price`] built in code is limited
//! to 15 significant digits, the precision an `f64` carries exactly, so a
//! saved price always reads back unchanged.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};

/// Largest normalized mantissa (exclusive) that survives a trip through `f64`.
const MAX_EXACT_MANTISSA: u128 = 1_000_000_000_000_000;

/// Errors that can occur when creating a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount has more than 15 significant digits.
    #[error("price {0} cannot be stored exactly (at most 15 significant digits)")]
    Unrepresentable(Decimal),
}

/// A product price in the store currency's standard unit (e.g., dollars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Unrepresentable`] if `amount` needs more than 15
    /// significant digits, either from its integer part or its fraction.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.normalize().mantissa().unsigned_abs() >= MAX_EXACT_MANTISSA {
            return Err(PriceError::Unrepresentable(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Parse the decimal text so the float is the nearest one to the amount.
        let value = f64::from_str(&self.0.to_string()).map_err(ser::Error::custom)?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `f64` displays as the shortest text that reads back as the same float.
        let value = f64::deserialize(deserializer)?;
        Decimal::from_str(&value.to_string())
            .map(Self)
            .map_err(|_| de::Error::custom(format!("price {value} is out of range")))
    }
}
