//! Database operations for the Mercato `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Session-authenticated storefront users
//! - `products` - Catalog rows the cart and snapshots price against
//! - `carts` / `cart_items` - The live per-user cart
//! - `pending_payments` - Staged order payloads keyed by transaction reference
//! - `order_addresses` / `orders` / `order_items` - Materialized orders
//! - `tower_sessions` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are embedded at compile
//! time via `sqlx::migrate!`; the binary applies them on startup.

mod carts;
mod orders;
mod pending_payments;
mod products;
mod users;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use pending_payments::PendingPaymentRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The targeted row does not exist.
    #[error("row not found")]
    NotFound,

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed to decode into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
