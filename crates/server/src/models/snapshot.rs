//! The staged order snapshot embedded in a pending payment.
//!
//! A snapshot is a point-in-time copy of the cart (quantities and unit
//! prices) plus the shipping address, taken at payment initiation. It is the
//! only source the materializer reads from, so price changes between
//! initiation and reconciliation cannot move the charged amount.
//!
//! The payload is an explicit tagged structure validated before it is ever
//! written, not a free-form blob.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mercato_core::ProductId;

use super::cart::CartLine;

/// Validation errors for an [`OrderSnapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot has no items.
    #[error("snapshot must contain at least one item")]
    NoItems,
    /// An item has a non-positive quantity.
    #[error("item for product {product_id} has non-positive quantity {quantity}")]
    BadQuantity {
        product_id: ProductId,
        quantity: i32,
    },
    /// An item has a negative unit price.
    #[error("item for product {product_id} has negative unit price")]
    NegativePrice { product_id: ProductId },
    /// A required address field is empty.
    #[error("address field `{0}` cannot be empty")]
    EmptyAddressField(&'static str),
}

/// The shipping address captured at initiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub sub_city: String,
    pub street: String,
    #[serde(default)]
    pub house_no: Option<String>,
}

impl AddressSnapshot {
    /// Check that every required field is present and non-blank.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::EmptyAddressField` naming the first offender.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let required = [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("city", &self.city),
            ("sub_city", &self.sub_city),
            ("street", &self.street),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SnapshotError::EmptyAddressField(field));
            }
        }
        Ok(())
    }
}

/// One cart line frozen at initiation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price at the instant the snapshot was taken.
    pub unit_price: Decimal,
}

impl From<&CartLine> for ItemSnapshot {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// The full staged payload: address plus frozen cart lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub address: AddressSnapshot,
    pub items: Vec<ItemSnapshot>,
}

impl OrderSnapshot {
    /// Build a snapshot from the live cart and a validated address.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::NoItems` for an empty cart, or a field error
    /// if the address or any line fails validation.
    pub fn from_cart(address: AddressSnapshot, lines: &[CartLine]) -> Result<Self, SnapshotError> {
        let snapshot = Self {
            address,
            items: lines.iter().map(ItemSnapshot::from).collect(),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Validate the snapshot before it is written.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.address.validate()?;

        if self.items.is_empty() {
            return Err(SnapshotError::NoItems);
        }

        for item in &self.items {
            if item.quantity <= 0 {
                return Err(SnapshotError::BadQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                });
            }
            if item.unit_price < Decimal::ZERO {
                return Err(SnapshotError::NegativePrice {
                    product_id: item.product_id,
                });
            }
        }

        Ok(())
    }

    /// The total to charge: the sum of `quantity x unit_price` over all items.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum()
    }
}
