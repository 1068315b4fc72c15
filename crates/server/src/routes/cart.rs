//! Cart route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use mercato_core::ProductId;

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::CartLine;
use crate::state::AppState;

/// One cart line as returned by the API.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// The cart with its totals.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_items: i64,
    pub total_price: Decimal,
}

impl CartView {
    fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            items: lines.iter().map(CartLineView::from).collect(),
            total_items: lines.iter().map(|l| i64::from(l.quantity)).sum(),
            total_price: lines.iter().map(CartLine::line_total).sum(),
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartBody {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Remove-from-cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartBody {
    pub product_id: ProductId,
}

/// Show the current cart with item and price totals.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<CartView>> {
    let lines = CartRepository::new(state.pool()).lines(user.id).await?;
    Ok(Json(CartView::from_lines(&lines)))
}

/// Add a product to the cart, incrementing an existing line.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AddToCartBody>,
) -> Result<impl IntoResponse> {
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be positive".to_string()));
    }
    let quantity = i32::try_from(quantity)
        .map_err(|_| AppError::BadRequest("quantity too large".to_string()))?;

    // Inactive or unknown products can't be added
    ProductRepository::new(state.pool())
        .get_active(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {} not found", body.product_id)))?;

    CartRepository::new(state.pool())
        .add_item(user.id, body.product_id, quantity)
        .await?;

    Ok(Json(json!({"message": "item added to cart"})))
}

/// Remove a product line from the cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<RemoveFromCartBody>,
) -> Result<impl IntoResponse> {
    let removed = CartRepository::new(state.pool())
        .remove_item(user.id, body.product_id)
        .await?;

    if !removed {
        return Err(AppError::NotFound(format!(
            "product {} is not in the cart",
            body.product_id
        )));
    }

    Ok(Json(json!({"message": "item removed from cart"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cart_view_totals() {
        let lines = vec![
            CartLine {
                product_id: ProductId::new(1),
                name: "Product A".to_string(),
                quantity: 2,
                unit_price: dec!(10.00),
            },
            CartLine {
                product_id: ProductId::new(2),
                name: "Product B".to_string(),
                quantity: 1,
                unit_price: dec!(5.00),
            },
        ];

        let view = CartView::from_lines(&lines);
        assert_eq!(view.total_items, 3);
        assert_eq!(view.total_price, dec!(25.00));
        assert_eq!(view.items[0].line_total, dec!(20.00));
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from_lines(&[]);
        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_price, Decimal::ZERO);
        assert!(view.items.is_empty());
    }
}
