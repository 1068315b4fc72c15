//! Order repository: materialization-time inserts and history queries.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use mercato_core::{AddressId, OrderId, OrderStatus, TxRef, UserId};

use super::RepositoryError;
use crate::models::{AddressSnapshot, ItemSnapshot, Order, OrderAddress, OrderItem};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the order address inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_address_in_tx(
        conn: &mut PgConnection,
        user_id: UserId,
        address: &AddressSnapshot,
    ) -> Result<OrderAddress, RepositoryError> {
        let row = sqlx::query_as::<_, OrderAddress>(
            r"
            INSERT INTO order_addresses (user_id, full_name, phone, city, sub_city, street, house_no)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, full_name, phone, city, sub_city, street, house_no, created_at
            ",
        )
        .bind(user_id)
        .bind(&address.full_name)
        .bind(&address.phone)
        .bind(&address.city)
        .bind(&address.sub_city)
        .bind(&address.street)
        .bind(address.house_no.as_deref())
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    /// Insert the order row inside an open transaction.
    ///
    /// The order is born paid and completed: it only materializes once the
    /// gateway has confirmed the payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order for the reference
    /// already exists. Returns `RepositoryError::Database` for other errors.
    pub async fn insert_order_in_tx(
        conn: &mut PgConnection,
        user_id: UserId,
        address_id: AddressId,
        total_price: Decimal,
        tx_ref: &TxRef,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (user_id, address_id, total_price, is_paid, status, transaction_reference)
            VALUES ($1, $2, $3, TRUE, $4, $5)
            RETURNING id, user_id, address_id, total_price, is_paid, status,
                      transaction_reference, created_at
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .bind(total_price)
        .bind(OrderStatus::Completed)
        .bind(tx_ref)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "order already exists for transaction reference".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        Ok(order)
    }

    /// Bulk-insert order items from the snapshot inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_items_in_tx(
        conn: &mut PgConnection,
        order_id: OrderId,
        items: &[ItemSnapshot],
    ) -> Result<(), RepositoryError> {
        let product_ids: Vec<i32> = items.iter().map(|i| i.product_id.as_i32()).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let unit_prices: Vec<Decimal> = items.iter().map(|i| i.unit_price).collect();

        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            SELECT $1::int, product_id, quantity, unit_price
            FROM UNNEST($2::int[], $3::int[], $4::numeric[])
                AS t (product_id, quantity, unit_price)
            ",
        )
        .bind(order_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// List the user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, address_id, total_price, is_paid, status,
                   transaction_reference, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get one of the user's orders by ID.
    ///
    /// Scoped to the user so one customer cannot read another's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, address_id, total_price, is_paid, status,
                   transaction_reference, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// The items belonging to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// The address recorded for an order, if still present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn address(
        &self,
        address_id: AddressId,
    ) -> Result<Option<OrderAddress>, RepositoryError> {
        let address = sqlx::query_as::<_, OrderAddress>(
            r"
            SELECT id, user_id, full_name, phone, city, sub_city, street, house_no, created_at
            FROM order_addresses
            WHERE id = $1
            ",
        )
        .bind(address_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(address)
    }
}
