//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Responses are JSON `{error, details?}` bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::db::RepositoryError;
use crate::gateway::GatewayError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Payment gateway operation failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The gateway verified the transaction as unpaid.
    #[error("Payment not completed")]
    PaymentNotCompleted,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart | CheckoutError::Invalid(_) => {
                Self::BadRequest(err.to_string())
            }
            CheckoutError::NoPendingPayment => Self::NotFound(err.to_string()),
            CheckoutError::PaymentNotCompleted => Self::PaymentNotCompleted,
            CheckoutError::Gateway(e) => Self::Gateway(e),
            CheckoutError::Repository(e) => Self::Database(e),
            CheckoutError::CorruptSnapshot(msg) => Self::Internal(msg),
        }
    }
}

impl AppError {
    /// HTTP status code this error maps to.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentNotCompleted | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_) | Self::Gateway(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => json!({"error": "not found"}),
                RepositoryError::Conflict(msg) => json!({"error": msg}),
                _ => json!({"error": "internal server error"}),
            },
            Self::Internal(_) => json!({"error": "internal server error"}),
            Self::Gateway(err) => json!({
                "error": "payment gateway error",
                "details": err.to_string(),
            }),
            Self::PaymentNotCompleted => json!({
                "error": "payment was not completed",
                "details": "transaction not confirmed by the gateway; pending order retained",
            }),
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Unauthorized(msg) => {
                json!({"error": msg})
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::PaymentNotCompleted),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_mapping() {
        assert_eq!(
            get_status(AppError::from(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::from(CheckoutError::NoPendingPayment)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::from(CheckoutError::PaymentNotCompleted)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::from(CheckoutError::CorruptSnapshot(
                "bad json".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gateway_errors_map_to_bad_gateway() {
        let declined = GatewayError::Declined {
            message: "invalid currency".to_string(),
        };
        assert_eq!(
            get_status(AppError::from(CheckoutError::Gateway(declined))),
            StatusCode::BAD_GATEWAY
        );

        let malformed = GatewayError::Malformed("truncated".to_string());
        assert_eq!(get_status(AppError::Gateway(malformed)), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "duplicate".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }
}
