//! Payment gateway HTTP client.
//!
//! Two operations against the external payment provider's REST API, both
//! bearer-token authenticated JSON request/response:
//!
//! 1. `initialize` - stage a transaction remotely and obtain the hosted
//!    checkout URL the customer is redirected to.
//! 2. `verify` - ask the gateway, server-side, whether a transaction was
//!    actually paid. Callback query parameters are never trusted.
//!
//! Transport failures (timeout, connection refused, DNS) and
//! application-level failures (a well-formed response saying "no") surface
//! as distinct [`GatewayError`] variants so callers can decide
//! retry-ability.

mod types;

pub use types::{InitializeRequest, VerifiedTransaction};

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use thiserror::Error;

use mercato_core::TxRef;

use crate::config::GatewayConfig;
use types::{Envelope, GATEWAY_STATUS_SUCCESS, InitializeData, VerifyData};

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never completed: timeout, connection or protocol failure.
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code of the response.
        status: reqwest::StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The gateway answered 200 but reported failure in the envelope.
    #[error("gateway declined the request: {message}")]
    Declined {
        /// The gateway's message, if any.
        message: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

impl GatewayError {
    /// Whether this failure happened below the application layer.
    ///
    /// Transport failures are candidates for retry with the same reference;
    /// application-level failures are not.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Client for the payment gateway's transaction API.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    timeout: Duration,
}

impl GatewayClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            inner: Arc::new(GatewayClientInner {
                client: reqwest::Client::new(),
                api_base: config.api_base.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.expose_secret().to_string(),
                timeout: config.timeout,
            }),
        }
    }

    /// Initialize a transaction and return the hosted checkout URL.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the request doesn't complete,
    /// `GatewayError::Api` on a non-2xx response, `GatewayError::Declined`
    /// if the gateway rejects the initialization, and
    /// `GatewayError::Malformed` if the success response carries no checkout
    /// URL.
    pub async fn initialize(&self, request: &InitializeRequest) -> Result<String, GatewayError> {
        let url = format!("{}/transaction/initialize", self.inner.api_base);

        let response = self
            .inner
            .client
            .post(&url)
            .timeout(self.inner.timeout)
            .bearer_auth(&self.inner.secret_key)
            .json(request)
            .send()
            .await?;

        let envelope: Envelope<InitializeData> = Self::read_envelope(response).await?;

        if envelope.status != GATEWAY_STATUS_SUCCESS {
            return Err(GatewayError::Declined {
                message: envelope.message.unwrap_or_else(|| "(no message)".to_string()),
            });
        }

        envelope
            .data
            .and_then(|data| data.checkout_url)
            .ok_or_else(|| {
                GatewayError::Malformed("success response missing checkout_url".to_string())
            })
    }

    /// Verify a transaction server-side.
    ///
    /// A transaction that the gateway reports as unpaid is **not** an error:
    /// the result carries `is_success = false` and the raw payload, and the
    /// caller decides what to do.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the request doesn't complete,
    /// `GatewayError::Api` on a non-2xx response, and
    /// `GatewayError::Malformed` on an undecodable body.
    pub async fn verify(&self, tx_ref: &TxRef) -> Result<VerifiedTransaction, GatewayError> {
        let url = format!("{}/transaction/verify/{}", self.inner.api_base, tx_ref);

        let response = self
            .inner
            .client
            .get(&url)
            .timeout(self.inner.timeout)
            .bearer_auth(&self.inner.secret_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Api { status, body });
        }

        let raw: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let envelope: Envelope<VerifyData> = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        // Paid means both the envelope and the transaction itself say so.
        let is_success = envelope.status == GATEWAY_STATUS_SUCCESS
            && envelope
                .data
                .is_some_and(|data| data.status.as_deref() == Some(GATEWAY_STATUS_SUCCESS));

        Ok(VerifiedTransaction { is_success, raw })
    }

    /// Read a response into the gateway's JSON envelope, mapping non-2xx
    /// statuses to `GatewayError::Api`.
    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>, GatewayError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transport_classification() {
        let api = GatewayError::Api {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "{}".to_string(),
        };
        assert!(!api.is_transport());

        let declined = GatewayError::Declined {
            message: "insufficient funds".to_string(),
        };
        assert!(!declined.is_transport());

        let malformed = GatewayError::Malformed("truncated body".to_string());
        assert!(!malformed.is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::Declined {
            message: "invalid currency".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "gateway declined the request: invalid currency"
        );

        let err = GatewayError::Malformed("missing field".to_string());
        assert_eq!(err.to_string(), "malformed gateway response: missing field");
    }
}
