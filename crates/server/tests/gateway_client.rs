//! Gateway client tests against a stub HTTP gateway.
//!
//! Each test spins up a local axum server playing the gateway's role, so the
//! real client code path (auth header, envelope parsing, error
//! classification) is exercised over actual HTTP.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};

use mercato_core::{CurrencyCode, TxRef};
use mercato_server::config::GatewayConfig;
use mercato_server::gateway::{GatewayClient, GatewayError, InitializeRequest};

const TEST_SECRET: &str = "CHASECK-k9Q2xL7mN4pR8tV1wZ5y";

/// Bind a stub gateway on an ephemeral port and return its API base URL.
async fn spawn_gateway(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub gateway");
    let addr = listener.local_addr().expect("stub gateway addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve stub");
    });
    format!("http://{addr}/v1")
}

fn client_for(api_base: String) -> GatewayClient {
    GatewayClient::new(&GatewayConfig {
        api_base,
        secret_key: SecretString::from(TEST_SECRET),
        currency: CurrencyCode::ETB,
        timeout: Duration::from_secs(2),
        callback_url: None,
        return_url: None,
    })
}

fn initialize_request() -> InitializeRequest {
    InitializeRequest {
        amount: "25.00".parse().expect("decimal"),
        currency: "ETB".to_string(),
        email: "abebe@example.com".to_string(),
        first_name: Some("Abebe".to_string()),
        last_name: None,
        tx_ref: TxRef::parse("mkt-itest1").expect("tx ref"),
        callback_url: "https://shop.example/payment/callback".to_string(),
        return_url: None,
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TEST_SECRET}"))
}

#[tokio::test]
async fn initialize_returns_checkout_url() {
    let router = Router::new().route(
        "/v1/transaction/initialize",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            if !bearer_ok(&headers) {
                return (StatusCode::UNAUTHORIZED, Json(json!({"message": "nope"})));
            }
            // The client must send the reference and the exact decimal amount
            assert_eq!(body["tx_ref"], "mkt-itest1");
            assert_eq!(body["amount"], "25.00");
            assert_eq!(body["email"], "abebe@example.com");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "message": "Hosted Link",
                    "data": {"checkout_url": "https://checkout.gateway.example/pay/abc123"}
                })),
            )
        }),
    );

    let client = client_for(spawn_gateway(router).await);
    let url = client
        .initialize(&initialize_request())
        .await
        .expect("initialize should succeed");

    assert_eq!(url, "https://checkout.gateway.example/pay/abc123");
}

#[tokio::test]
async fn initialize_declined_by_gateway() {
    let router = Router::new().route(
        "/v1/transaction/initialize",
        post(|| async {
            Json(json!({"status": "failed", "message": "Invalid currency", "data": null}))
        }),
    );

    let client = client_for(spawn_gateway(router).await);
    let err = client
        .initialize(&initialize_request())
        .await
        .expect_err("declined initialization must error");

    assert!(!err.is_transport());
    match err {
        GatewayError::Declined { message } => assert_eq!(message, "Invalid currency"),
        other => panic!("expected Declined, got {other:?}"),
    }
}

#[tokio::test]
async fn initialize_http_error_is_api_error() {
    let router = Router::new().route(
        "/v1/transaction/initialize",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid API Key"})),
            )
        }),
    );

    let client = client_for(spawn_gateway(router).await);
    let err = client
        .initialize(&initialize_request())
        .await
        .expect_err("401 must error");

    match err {
        GatewayError::Api { status, .. } => assert_eq!(status, StatusCode::UNAUTHORIZED),
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn initialize_missing_checkout_url_is_malformed() {
    let router = Router::new().route(
        "/v1/transaction/initialize",
        post(|| async { Json(json!({"status": "success", "message": "ok", "data": {}})) }),
    );

    let client = client_for(spawn_gateway(router).await);
    let err = client
        .initialize(&initialize_request())
        .await
        .expect_err("missing checkout_url must error");

    assert!(matches!(err, GatewayError::Malformed(_)));
}

#[tokio::test]
async fn initialize_connection_refused_is_transport() {
    // Nothing listens here; the connection is refused outright
    let client = client_for("http://127.0.0.1:9".to_string());
    let err = client
        .initialize(&initialize_request())
        .await
        .expect_err("refused connection must error");

    assert!(err.is_transport(), "expected Transport, got {err:?}");
}

#[tokio::test]
async fn initialize_timeout_is_transport() {
    let router = Router::new().route(
        "/v1/transaction/initialize",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"status": "success"}))
        }),
    );

    let api_base = spawn_gateway(router).await;
    let client = GatewayClient::new(&GatewayConfig {
        api_base,
        secret_key: SecretString::from(TEST_SECRET),
        currency: CurrencyCode::ETB,
        timeout: Duration::from_millis(200),
        callback_url: None,
        return_url: None,
    });

    let err = client
        .initialize(&initialize_request())
        .await
        .expect_err("timeout must error");

    assert!(err.is_transport(), "expected Transport, got {err:?}");
}

#[tokio::test]
async fn verify_paid_transaction() {
    let router = Router::new().route(
        "/v1/transaction/verify/{tx_ref}",
        get(|headers: HeaderMap, Path(tx_ref): Path<String>| async move {
            assert!(bearer_ok(&headers), "verify must be authenticated");
            Json(json!({
                "status": "success",
                "message": "Payment details",
                "data": {
                    "status": "success",
                    "tx_ref": tx_ref,
                    "amount": "25.00",
                    "currency": "ETB"
                }
            }))
        }),
    );

    let client = client_for(spawn_gateway(router).await);
    let tx_ref = TxRef::parse("mkt-paid1").expect("tx ref");
    let verified = client.verify(&tx_ref).await.expect("verify should succeed");

    assert!(verified.is_success);
    assert_eq!(verified.raw["data"]["tx_ref"], "mkt-paid1");
}

#[tokio::test]
async fn verify_unpaid_transaction_is_not_an_error() {
    let router = Router::new().route(
        "/v1/transaction/verify/{tx_ref}",
        get(|| async {
            Json(json!({
                "status": "success",
                "data": {"status": "pending"}
            }))
        }),
    );

    let client = client_for(spawn_gateway(router).await);
    let tx_ref = TxRef::parse("mkt-unpaid1").expect("tx ref");
    let verified = client.verify(&tx_ref).await.expect("verify should succeed");

    // An unpaid transaction is a normal outcome, not a gateway failure
    assert!(!verified.is_success);
}

#[tokio::test]
async fn verify_failed_envelope_is_not_success() {
    let router = Router::new().route(
        "/v1/transaction/verify/{tx_ref}",
        get(|| async {
            Json(json!({"status": "failed", "message": "Transaction not found", "data": null}))
        }),
    );

    let client = client_for(spawn_gateway(router).await);
    let tx_ref = TxRef::parse("mkt-unknown1").expect("tx ref");
    let verified = client.verify(&tx_ref).await.expect("verify should succeed");

    assert!(!verified.is_success);
}

#[tokio::test]
async fn verify_http_error_is_api_error() {
    let router = Router::new().route(
        "/v1/transaction/verify/{tx_ref}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "no such tx"}))) }),
    );

    let client = client_for(spawn_gateway(router).await);
    let tx_ref = TxRef::parse("mkt-missing1").expect("tx ref");
    let err = client
        .verify(&tx_ref)
        .await
        .expect_err("404 must error");

    match err {
        GatewayError::Api { status, .. } => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("expected Api, got {other:?}"),
    }
}
