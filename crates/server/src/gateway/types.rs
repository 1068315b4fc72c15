//! Wire types for the payment gateway's transaction API.
//!
//! The gateway wraps every response in a `{status, message, data}` envelope.
//! Amounts travel as decimal strings; `rust_decimal`'s string serde keeps
//! them exact end to end.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mercato_core::TxRef;

/// Envelope `status` value for a successful operation/transaction.
pub(super) const GATEWAY_STATUS_SUCCESS: &str = "success";

/// The JSON envelope every gateway response is wrapped in.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// `data` payload of an initialize response.
#[derive(Debug, Deserialize)]
pub(super) struct InitializeData {
    #[serde(default)]
    pub checkout_url: Option<String>,
}

/// `data` payload of a verify response.
#[derive(Debug, Deserialize)]
pub(super) struct VerifyData {
    /// Transaction-level status: "success", "failed", or "pending".
    #[serde(default)]
    pub status: Option<String>,
}

/// Request body for initializing a transaction.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    /// Amount to charge, serialized as a decimal string.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Customer email, required by the gateway.
    pub email: String,
    /// Customer first name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Customer last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Our transaction reference, echoed back in the callback.
    pub tx_ref: TxRef,
    /// URL the gateway calls asynchronously once payment settles.
    pub callback_url: String,
    /// URL the customer is sent back to after the hosted checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

/// Outcome of a server-side verification.
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    /// Whether the gateway confirms the transaction as paid.
    pub is_success: bool,
    /// The full response payload, retained for audit logging.
    pub raw: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_initialize_request_serializes_amount_as_string() {
        let request = InitializeRequest {
            amount: dec!(25.00),
            currency: "ETB".to_string(),
            email: "abebe@example.com".to_string(),
            first_name: Some("Abebe".to_string()),
            last_name: None,
            tx_ref: TxRef::parse("mkt-test123").unwrap(),
            callback_url: "https://shop.example/payment/callback".to_string(),
            return_url: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["amount"], "25.00");
        assert_eq!(value["tx_ref"], "mkt-test123");
        // Absent optional fields are omitted entirely
        assert!(value.get("last_name").is_none());
        assert!(value.get("return_url").is_none());
    }

    #[test]
    fn test_envelope_parses_success_initialize() {
        let json = r#"{
            "status": "success",
            "message": "Hosted Link",
            "data": {"checkout_url": "https://checkout.gateway.example/pay/abc"}
        }"#;
        let envelope: Envelope<InitializeData> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "success");
        assert_eq!(
            envelope.data.unwrap().checkout_url.as_deref(),
            Some("https://checkout.gateway.example/pay/abc")
        );
    }

    #[test]
    fn test_envelope_parses_failure_without_data() {
        let json = r#"{"status": "failed", "message": "Invalid currency"}"#;
        let envelope: Envelope<InitializeData> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "failed");
        assert_eq!(envelope.message.as_deref(), Some("Invalid currency"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_parses_null_data() {
        let json = r#"{"status": "failed", "message": null, "data": null}"#;
        let envelope: Envelope<VerifyData> = serde_json::from_str(json).unwrap();
        assert!(envelope.message.is_none());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_verify_data_tolerates_extra_fields() {
        let json = r#"{
            "status": "success",
            "data": {
                "status": "success",
                "amount": "25.00",
                "currency": "ETB",
                "tx_ref": "mkt-abc",
                "charge": "0.35"
            }
        }"#;
        let envelope: Envelope<VerifyData> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.unwrap().status.as_deref(), Some("success"));
    }
}
