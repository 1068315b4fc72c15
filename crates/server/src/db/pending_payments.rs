//! Pending payment store: staged order payloads keyed by transaction reference.
//!
//! The uniqueness constraint on `transaction_reference` plus
//! lock-then-delete inside the materialization transaction is what serializes
//! duplicate callback deliveries: the second caller blocks on the row lock,
//! finds the row gone, and reports not-found instead of double-creating an
//! order.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use mercato_core::{TxRef, UserId};

use super::RepositoryError;
use crate::models::PendingPayment;

/// Repository for pending payment database operations.
pub struct PendingPaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PendingPaymentRepository<'a> {
    /// Create a new pending payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stage a payment: persist the snapshot keyed by its reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &self,
        tx_ref: &TxRef,
        user_id: UserId,
        total_price: Decimal,
        order_details: &serde_json::Value,
    ) -> Result<PendingPayment, RepositoryError> {
        let pending = sqlx::query_as::<_, PendingPayment>(
            r"
            INSERT INTO pending_payments (transaction_reference, user_id, total_price, order_details)
            VALUES ($1, $2, $3, $4)
            RETURNING id, transaction_reference, user_id, total_price, order_details, created_at
            ",
        )
        .bind(tx_ref)
        .bind(user_id)
        .bind(total_price)
        .bind(order_details)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(
                    "transaction reference already staged".to_owned(),
                );
            }
            RepositoryError::Database(e)
        })?;

        Ok(pending)
    }

    /// Look up a pending payment by its transaction reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_reference(
        &self,
        tx_ref: &TxRef,
    ) -> Result<Option<PendingPayment>, RepositoryError> {
        let pending = sqlx::query_as::<_, PendingPayment>(
            r"
            SELECT id, transaction_reference, user_id, total_price, order_details, created_at
            FROM pending_payments
            WHERE transaction_reference = $1
            ",
        )
        .bind(tx_ref)
        .fetch_optional(self.pool)
        .await?;

        Ok(pending)
    }

    /// Re-read and row-lock a pending payment inside an open transaction.
    ///
    /// A concurrent reconciliation of the same reference blocks here until
    /// the first transaction commits, then observes the deleted row as
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_in_tx(
        conn: &mut PgConnection,
        tx_ref: &TxRef,
    ) -> Result<Option<PendingPayment>, RepositoryError> {
        let pending = sqlx::query_as::<_, PendingPayment>(
            r"
            SELECT id, transaction_reference, user_id, total_price, order_details, created_at
            FROM pending_payments
            WHERE transaction_reference = $1
            FOR UPDATE
            ",
        )
        .bind(tx_ref)
        .fetch_optional(conn)
        .await?;

        Ok(pending)
    }

    /// Consume a pending payment inside an open transaction.
    ///
    /// This is the final write of order materialization.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete_in_tx(
        conn: &mut PgConnection,
        tx_ref: &TxRef,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM pending_payments
            WHERE transaction_reference = $1
            ",
        )
        .bind(tx_ref)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
