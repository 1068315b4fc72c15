//! Domain models for the checkout backend.
//!
//! Row-backed types live here, separate from the repositories that load them
//! and the handlers that serialize them.

pub mod cart;
pub mod order;
pub mod snapshot;
pub mod user;

pub use cart::{CartLine, Product};
pub use order::{Order, OrderAddress, OrderItem, PendingPayment};
pub use snapshot::{AddressSnapshot, ItemSnapshot, OrderSnapshot, SnapshotError};
pub use user::User;

/// Session storage keys.
pub mod session_keys {
    /// The authenticated user's ID.
    pub const USER_ID: &str = "user_id";
}
