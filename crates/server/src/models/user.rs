//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mercato_core::{Email, UserId};

/// A storefront user.
///
/// Identity plumbing (registration, password reset, JWT issuance) lives
/// outside this service; a user row is just enough to own a cart, receive
/// orders, and give the payment gateway a contact.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Optional first name, passed to the gateway as customer contact info.
    pub first_name: Option<String>,
    /// Optional last name, passed to the gateway as customer contact info.
    pub last_name: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
