//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Payment (the checkout reconciliation flow)
//! POST /payment/initiate       - Snapshot cart, stage payment, get checkout URL
//! GET  /payment/callback       - Gateway callback; verifies and materializes the order
//!
//! # Cart
//! GET  /cart                   - Cart contents with totals
//! POST /cart/add               - Add a product (increments an existing line)
//! POST /cart/remove            - Remove a product line
//!
//! # Orders (requires auth)
//! GET  /orders                 - Order history, newest first
//! GET  /orders/{id}            - Order detail with items and address
//!
//! # Auth (session identity shim)
//! POST /auth/login             - Resolve a user by email, store in session
//! POST /auth/logout            - Clear the session
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod payment;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(payment::initiate))
        .route("/callback", get(payment::callback))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/payment", payment_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
}
