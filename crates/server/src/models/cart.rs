//! Catalog and cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use mercato_core::ProductId;

/// A catalog product.
///
/// Only the fields the checkout flow needs: the cart joins against `price`
/// at snapshot time, and `is_active`/`stock` gate what can be added.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub price: Decimal,
    /// Units in stock.
    pub stock: i32,
    /// Whether the product is purchasable.
    pub is_active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// One line of a user's live cart, joined with the product it references.
///
/// `unit_price` is the product's price *now* - the checkout flow copies it
/// into a snapshot at initiation so later catalog changes cannot move a
/// charged amount.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    /// Product this line references.
    pub product_id: ProductId,
    /// Product display name.
    pub name: String,
    /// Units of the product in the cart.
    pub quantity: i32,
    /// The product's current unit price.
    pub unit_price: Decimal,
}

impl CartLine {
    /// The line's total at the current unit price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_core::ProductId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_total() {
        let line = CartLine {
            product_id: ProductId::new(1),
            name: "Roasted coffee 500g".to_string(),
            quantity: 3,
            unit_price: dec!(12.50),
        };
        assert_eq!(line.line_total(), dec!(37.50));
    }
}
