//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: `@GoMarketplace:products`)
//! - `CART_STORAGE_PATH` - File backing the device-local store (default: `cart-storage.json`)
//! - `CART_DECREMENT_POLICY` - `unbounded`, `floor` or `remove` (default: `unbounded`)

use std::path::PathBuf;

use go_marketplace_core::DecrementPolicy;
use thiserror::Error;

/// Key the serialized cart lives under in the key-value store.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:products";

/// Default location of the file-backed store.
pub const DEFAULT_STORAGE_PATH: &str = "cart-storage.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Key the serialized cart is stored under
    pub storage_key: String,
    /// Path of the file-backed store
    pub storage_path: PathBuf,
    /// Behavior of `decrement` at zero
    pub decrement_policy: DecrementPolicy,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            decrement_policy: DecrementPolicy::default(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_key = lookup("CART_STORAGE_KEY")
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        let storage_path = lookup("CART_STORAGE_PATH")
            .filter(|path| !path.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);
        let decrement_policy = match lookup("CART_DECREMENT_POLICY") {
            Some(value) => value.parse::<DecrementPolicy>().map_err(|e| {
                ConfigError::InvalidEnvVar("CART_DECREMENT_POLICY".to_string(), e.to_string())
            })?,
            None => DecrementPolicy::default(),
        };

        Ok(Self {
            storage_key,
            storage_path,
            decrement_policy,
        })
    }

    /// Override the storage path.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Override the decrement policy.
    #[must_use]
    pub const fn with_decrement_policy(mut self, policy: DecrementPolicy) -> Self {
        self.decrement_policy = policy;
        self
    }
}
