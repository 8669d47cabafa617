//! GoMarketplace CLI - Inspect and edit the device-local cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the stored cart
//! gm-cart list
//!
//! # Add a product (or bump its quantity)
//! gm-cart add --id 1 --title "Cadeira Rivatti" --image-url https://example.com/1.png --price 400
//!
//! # Change quantities
//! gm-cart increment 1
//! gm-cart decrement 1
//!
//! # Empty the cart and delete the stored copy
//! gm-cart clear
//! ```
//!
//! # Environment Variables
//!
//! See `go_marketplace_cart::config`. Flags override the environment.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use go_marketplace_cart::{CartConfig, CartProvider, FileStore};
use go_marketplace_core::DecrementPolicy;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "GoMarketplace cart tools")]
struct Cli {
    /// Storage file (overrides `CART_STORAGE_PATH`)
    #[arg(long, global = true)]
    storage_path: Option<PathBuf>,

    /// Storage key (overrides `CART_STORAGE_KEY`)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Decrement behavior at zero: unbounded, floor or remove
    /// (overrides `CART_DECREMENT_POLICY`)
    #[arg(long, global = true)]
    decrement_policy: Option<DecrementPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the products in the cart
    List,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: Decimal,
    },
    /// Increase a product's quantity by one
    Increment {
        /// Product ID
        id: String,
    },
    /// Decrease a product's quantity by one
    Decrement {
        /// Product ID
        id: String,
    },
    /// Remove every product and the stored cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CartConfig::from_env()?;
    if let Some(path) = cli.storage_path {
        config = config.with_storage_path(path);
    }
    if let Some(key) = cli.key {
        config.storage_key = key;
    }
    if let Some(policy) = cli.decrement_policy {
        config = config.with_decrement_policy(policy);
    }

    let storage = Arc::new(FileStore::new(config.storage_path.clone()));
    let provider = CartProvider::mount(storage, config).await;
    let cart = provider.context();

    let result = match cli.command {
        Commands::List => commands::cart::list(&cart),
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&cart, &id, title, image_url, price),
        Commands::Increment { id } => commands::cart::increment(&cart, &id),
        Commands::Decrement { id } => commands::cart::decrement(&cart, &id),
        Commands::Clear => commands::cart::clear(&cart),
    };

    provider.unmount().await;
    Ok(result?)
}
