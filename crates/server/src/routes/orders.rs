//! Order history route handlers.
//!
//! Orders are created by payment reconciliation, never by these handlers;
//! this is the read side customers see after checkout.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use mercato_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Order, OrderAddress, OrderItem};
use crate::state::AppState;

/// An order with its items and recorded address.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub address: Option<OrderAddress>,
}

/// List the current user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// Show one of the current user's orders, with items and address.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let order_id = OrderId::new(id);
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get_for_user(user.id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    let items = repo.items(order.id).await?;
    let address = match order.address_id {
        Some(address_id) => repo.address(address_id).await?,
        None => None,
    };

    Ok(Json(OrderDetail {
        order,
        items,
        address,
    }))
}
