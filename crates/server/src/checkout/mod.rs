//! The checkout reconciliation flow.
//!
//! Two entry points, mirroring the two halves of a hosted-checkout payment:
//!
//! 1. [`CheckoutService::initiate_payment`] - snapshot the cart, stage a
//!    pending payment keyed by a fresh transaction reference, and ask the
//!    gateway for a checkout URL.
//! 2. [`CheckoutService::handle_callback`] - on the gateway's asynchronous
//!    callback, verify the transaction server-side and, if paid, atomically
//!    materialize the order (address, order row, items), clear the cart, and
//!    consume the pending payment.
//!
//! Invariant: at most one order per transaction reference. The pending row
//! is deleted in the same transaction that creates the order, and a
//! concurrent duplicate callback blocks on the row lock, finds nothing, and
//! reports not-found.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use mercato_core::TxRef;

use crate::config::ServerConfig;
use crate::db::{
    CartRepository, OrderRepository, PendingPaymentRepository, RepositoryError,
};
use crate::gateway::{GatewayClient, GatewayError, InitializeRequest};
use crate::models::{AddressSnapshot, Order, OrderSnapshot, SnapshotError, User};

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user's cart has no items.
    #[error("cannot initiate payment for an empty cart")]
    EmptyCart,

    /// The address or snapshot failed structural validation.
    #[error("invalid order data: {0}")]
    Invalid(#[from] SnapshotError),

    /// No pending payment exists for the reference.
    ///
    /// Also covers a reference that was already consumed: once the order
    /// materializes the row is gone, and a replayed callback lands here.
    #[error("no pending order for this transaction reference")]
    NoPendingPayment,

    /// The gateway reports the transaction as unpaid.
    ///
    /// The pending payment is left in place so a later callback can retry.
    #[error("payment was not completed")]
    PaymentNotCompleted,

    /// A gateway call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A database operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A stored snapshot no longer decodes; the row is left for inspection.
    #[error("corrupt order snapshot: {0}")]
    CorruptSnapshot(String),
}

/// Result of a successful payment initiation.
#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    /// Hosted checkout URL to redirect the customer to.
    pub payment_url: String,
    /// Reference correlating the pending payment with the gateway.
    pub tx_ref: TxRef,
}

/// Orchestrates payment initiation and callback reconciliation.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    gateway: &'a GatewayClient,
    config: &'a ServerConfig,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, gateway: &'a GatewayClient, config: &'a ServerConfig) -> Self {
        Self {
            pool,
            gateway,
            config,
        }
    }

    /// Initiate a payment for the user's current cart.
    ///
    /// Snapshots the cart (quantities and unit prices as of now), stages a
    /// pending payment under a fresh transaction reference, then initializes
    /// the remote transaction. The staged row is written *before* the
    /// gateway call; if initialization then fails the row stays behind,
    /// inert - its reference is never reused and verification for it can
    /// only fail.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::Invalid` for
    /// rejected input, `CheckoutError::Gateway` if the gateway call fails,
    /// and `CheckoutError::Repository` on persistence failures.
    #[instrument(skip(self, user, address), fields(user_id = %user.id))]
    pub async fn initiate_payment(
        &self,
        user: &User,
        address: AddressSnapshot,
    ) -> Result<InitiatedPayment, CheckoutError> {
        let lines = CartRepository::new(self.pool).lines(user.id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let snapshot = OrderSnapshot::from_cart(address, &lines)?;
        let total_price = snapshot.total_price();
        let tx_ref = TxRef::generate();

        let order_details = serde_json::to_value(&snapshot)
            .map_err(|e| CheckoutError::CorruptSnapshot(e.to_string()))?;
        PendingPaymentRepository::new(self.pool)
            .insert(&tx_ref, user.id, total_price, &order_details)
            .await?;

        tracing::info!(%tx_ref, %total_price, items = snapshot.items.len(), "staged pending payment");

        let request = build_initialize_request(self.config, user, total_price, tx_ref.clone());
        let payment_url = self.gateway.initialize(&request).await.inspect_err(|e| {
            // The staged row outlives a failed initialization; see module docs.
            tracing::warn!(%tx_ref, error = %e, "gateway initialization failed after staging");
        })?;

        Ok(InitiatedPayment {
            payment_url,
            tx_ref,
        })
    }

    /// Reconcile a gateway callback for the given transaction reference.
    ///
    /// The success flag implied by the callback is ignored; the transaction
    /// is verified server-side before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoPendingPayment` for an unknown (or already
    /// consumed) reference, `CheckoutError::PaymentNotCompleted` if the
    /// gateway reports the transaction unpaid, `CheckoutError::Gateway` if
    /// verification itself fails, and `CheckoutError::Repository` on
    /// persistence failures (which roll back completely, leaving the pending
    /// row intact).
    #[instrument(skip(self))]
    pub async fn handle_callback(&self, tx_ref: &TxRef) -> Result<Order, CheckoutError> {
        let pending = PendingPaymentRepository::new(self.pool)
            .get_by_reference(tx_ref)
            .await?
            .ok_or(CheckoutError::NoPendingPayment)?;

        let verified = self.gateway.verify(tx_ref).await?;
        if !verified.is_success {
            tracing::warn!(%tx_ref, raw = %verified.raw, "verification reports unpaid transaction");
            return Err(CheckoutError::PaymentNotCompleted);
        }

        let order = self.materialize(tx_ref).await?;
        tracing::info!(%tx_ref, order_id = %order.id, user_id = %pending.user_id, "order materialized");
        Ok(order)
    }

    /// Convert the staged payload into permanent order records.
    ///
    /// All writes - address, order, items, cart clear, pending-payment
    /// delete - commit or roll back as one transaction. The pending row is
    /// re-read under `FOR UPDATE` so concurrent reconciliations of the same
    /// reference serialize; the loser sees no row and reports not-found.
    async fn materialize(&self, tx_ref: &TxRef) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let Some(pending) = PendingPaymentRepository::lock_in_tx(&mut tx, tx_ref).await? else {
            return Err(CheckoutError::NoPendingPayment);
        };

        let snapshot: OrderSnapshot = serde_json::from_value(pending.order_details.clone())
            .map_err(|e| CheckoutError::CorruptSnapshot(e.to_string()))?;

        let address =
            OrderRepository::insert_address_in_tx(&mut tx, pending.user_id, &snapshot.address)
                .await?;
        let order = OrderRepository::insert_order_in_tx(
            &mut tx,
            pending.user_id,
            address.id,
            pending.total_price,
            tx_ref,
        )
        .await?;
        OrderRepository::insert_items_in_tx(&mut tx, order.id, &snapshot.items).await?;
        CartRepository::clear_in_tx(&mut tx, pending.user_id).await?;

        // Consuming the staged row is the final write before commit.
        PendingPaymentRepository::delete_in_tx(&mut tx, tx_ref).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(order)
    }
}

/// Assemble the gateway initialization request for a staged payment.
fn build_initialize_request(
    config: &ServerConfig,
    user: &User,
    total_price: rust_decimal::Decimal,
    tx_ref: TxRef,
) -> InitializeRequest {
    InitializeRequest {
        amount: total_price,
        currency: config.gateway.currency.to_string(),
        email: user.email.to_string(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        tx_ref,
        callback_url: config.payment_callback_url(),
        return_url: config.gateway.return_url.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mercato_core::{CurrencyCode, Email, UserId};
    use rust_decimal_macros::dec;
    use secrecy::SecretString;
    use std::time::Duration;

    use crate::config::GatewayConfig;

    fn config() -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://shop.example".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            gateway: GatewayConfig {
                api_base: "https://api.chapa.co/v1".to_string(),
                secret_key: SecretString::from("k9Q2xL7mN4pR8tV1"),
                currency: CurrencyCode::ETB,
                timeout: Duration::from_secs(10),
                callback_url: None,
                return_url: Some("https://shop.example/orders".to_string()),
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("abebe@example.com").unwrap(),
            first_name: Some("Abebe".to_string()),
            last_name: Some("Bikila".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_initialize_request() {
        let tx_ref = TxRef::generate();
        let request = build_initialize_request(&config(), &user(), dec!(25.00), tx_ref.clone());

        assert_eq!(request.amount, dec!(25.00));
        assert_eq!(request.currency, "ETB");
        assert_eq!(request.email, "abebe@example.com");
        assert_eq!(request.first_name.as_deref(), Some("Abebe"));
        assert_eq!(request.tx_ref, tx_ref);
        assert_eq!(
            request.callback_url,
            "https://shop.example/payment/callback"
        );
        assert_eq!(
            request.return_url.as_deref(),
            Some("https://shop.example/orders")
        );
    }

    #[test]
    fn test_checkout_error_messages() {
        assert_eq!(
            CheckoutError::EmptyCart.to_string(),
            "cannot initiate payment for an empty cart"
        );
        assert_eq!(
            CheckoutError::NoPendingPayment.to_string(),
            "no pending order for this transaction reference"
        );
        assert_eq!(
            CheckoutError::PaymentNotCompleted.to_string(),
            "payment was not completed"
        );
    }
}
