//! Order domain types: pending payments and materialized orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use mercato_core::{AddressId, OrderId, OrderItemId, OrderStatus, PendingPaymentId, ProductId, TxRef, UserId};

/// A staged order payload awaiting gateway confirmation.
///
/// Created at payment initiation, consumed (deleted) exactly when the
/// corresponding order is materialized. Owned exclusively by the checkout
/// flow; no other code reads or writes these rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingPayment {
    /// Unique row ID.
    pub id: PendingPaymentId,
    /// Reference correlating this row with the gateway transaction.
    pub transaction_reference: TxRef,
    /// User who initiated the payment.
    pub user_id: UserId,
    /// Total charged, computed from the snapshot at initiation.
    pub total_price: Decimal,
    /// The serialized [`super::OrderSnapshot`] (address + items).
    pub order_details: serde_json::Value,
    /// When the payment was initiated.
    pub created_at: DateTime<Utc>,
}

/// A materialized order.
///
/// Created exactly once per successful reconciliation; immutable afterward
/// except for status transitions performed by fulfillment.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// User the order belongs to.
    pub user_id: UserId,
    /// Shipping address, if still present.
    pub address_id: Option<AddressId>,
    /// Total charged for the order.
    pub total_price: Decimal,
    /// Whether payment has been confirmed.
    pub is_paid: bool,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Reference of the gateway transaction that paid for this order.
    pub transaction_reference: TxRef,
    /// When the order was materialized.
    pub created_at: DateTime<Utc>,
}

/// One line of a materialized order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    /// Unique row ID.
    pub id: OrderItemId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Product purchased.
    pub product_id: ProductId,
    /// Units purchased.
    pub quantity: i32,
    /// Unit price at purchase time, from the snapshot - never the live price.
    pub unit_price: Decimal,
}

/// The shipping address recorded for an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderAddress {
    /// Unique row ID.
    pub id: AddressId,
    /// User the address belongs to.
    pub user_id: UserId,
    /// Recipient's full name.
    pub full_name: String,
    /// Contact phone number.
    pub phone: String,
    /// City.
    pub city: String,
    /// Sub-city / district.
    pub sub_city: String,
    /// Street.
    pub street: String,
    /// House number, if any.
    pub house_no: Option<String>,
    /// When the address was recorded.
    pub created_at: DateTime<Utc>,
}
