//! Integration tests for the subscription HTTP endpoints.
//!
//! Drives the full router (layers included) with `tower::ServiceExt::oneshot`
//! against the in-memory store and the mock invoice provider.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use aegis::adapters::bitvora::MockInvoiceProvider;
use aegis::adapters::http::subscription::dto::RelayInfoResponse;
use aegis::adapters::http::{app_router, HttpSettings, SubscriptionAppState};
use aegis::adapters::memory::InMemorySubscriptionStore;
use aegis::application::{AuthorizationGate, InvoiceSettings};
use aegis::domain::subscription::{compute_signature, PaymentNotificationVerifier, SIGNATURE_HEADER};
use aegis::ports::InvoiceError;

const SECRET: &str = "integration_webhook_secret";
const NPUB: &str = "npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6";
const HEX: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    store: InMemorySubscriptionStore,
    invoices: MockInvoiceProvider,
    gate: Arc<AuthorizationGate>,
}

fn test_app() -> TestApp {
    let store = InMemorySubscriptionStore::new();
    let invoices = MockInvoiceProvider::new();
    let gate = Arc::new(AuthorizationGate::new(Arc::new(store.clone())));

    let state = SubscriptionAppState {
        store: Arc::new(store.clone()),
        invoice_provider: Arc::new(invoices.clone()),
        gate: gate.clone(),
        verifier: PaymentNotificationVerifier::new(SECRET),
        invoice_settings: InvoiceSettings {
            amount: 21000.0,
            ..InvoiceSettings::default()
        },
        store_timeout: Duration::from_secs(2),
        relay_info: Arc::new(RelayInfoResponse {
            name: "Paid Relay".to_string(),
            description: "Writes for subscribers".to_string(),
            price_per_year: 21000.0,
            currency: "sats".to_string(),
            ..RelayInfoResponse::default()
        }),
    };

    TestApp {
        router: app_router(state, &HttpSettings::default()),
        store,
        invoices,
        gate,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook(payload: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/bitvora_webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(payload.to_vec())).unwrap()
}

fn deposit_payload(npub: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "event": "deposit.lightning.completed",
        "data": {"id": "dep_42", "amount_sats": 21000, "metadata": {"npub": npub}}
    }))
    .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// =============================================================================
// /generate_invoice
// =============================================================================

#[tokio::test]
async fn generate_invoice_returns_invoice_and_creates_pending_record() {
    let app = test_app();

    let (status, body) = send(&app.router, post_json("/generate_invoice", json!({"npub": NPUB}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["message"], "Invoice generated");
    assert!(body["data"]["invoice"].as_str().unwrap().starts_with("lnbc"));
    assert_eq!(app.store.len().await, 1);
    assert_eq!(app.invoices.requests()[0].metadata["npub"], NPUB);
}

#[tokio::test]
async fn generate_invoice_accepts_identity_alias() {
    let app = test_app();

    let (status, _) = send(&app.router, post_json("/generate_invoice", json!({"identity": NPUB}))).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn generate_invoice_rejects_missing_or_invalid_identity() {
    let app = test_app();

    for body in [json!({}), json!({"npub": ""}), json!({"npub": "npub1bogus"})] {
        let (status, body) = send(&app.router, post_json("/generate_invoice", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["code"].is_string());
    }
    assert_eq!(app.invoices.call_count(), 0);
}

#[tokio::test]
async fn generate_invoice_maps_provider_failure_to_502() {
    let app = test_app();
    app.invoices.set_error(InvoiceError::Network("connection refused".to_string()));

    let (status, body) = send(&app.router, post_json("/generate_invoice", json!({"npub": NPUB}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "INVOICE_PROVIDER_ERROR");
}

// =============================================================================
// /bitvora_webhook
// =============================================================================

#[tokio::test]
async fn signed_deposit_activates_subscription() {
    let app = test_app();
    let payload = deposit_payload(NPUB);
    let signature = compute_signature(SECRET, &payload);

    let (status, body) = send(&app.router, webhook(&payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Subscription activated");
    assert_eq!(app.gate.authorize(HEX), Ok(()));
}

#[tokio::test]
async fn webhook_without_signature_is_401() {
    let app = test_app();

    let (status, body) = send(&app.router, webhook(&deposit_payload(NPUB), None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_SIGNATURE");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn webhook_with_wrong_secret_is_401() {
    let app = test_app();
    let payload = deposit_payload(NPUB);
    let signature = compute_signature("some_other_secret", &payload);

    let (status, _) = send(&app.router, webhook(&payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.gate.version(), 0);
}

#[tokio::test]
async fn authenticated_malformed_body_is_400() {
    let app = test_app();
    let payload = br#"{"event": 12}"#;
    let signature = compute_signature(SECRET, payload);

    let (status, body) = send(&app.router, webhook(payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_INPUT");
}

#[tokio::test]
async fn deposit_without_metadata_is_acknowledged() {
    let app = test_app();
    let payload = br#"{"event":"deposit.lightning.completed","data":{"id":"dep_7"}}"#;
    let signature = compute_signature(SECRET, payload);

    let (status, body) = send(&app.router, webhook(payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification acknowledged");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn store_failure_during_webhook_is_5xx_so_processor_retries() {
    let app = test_app();
    let payload = deposit_payload(NPUB);
    let signature = compute_signature(SECRET, &payload);
    app.store.fail_next(1);

    let (status, body) = send(&app.router, webhook(&payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "PERSISTENCE_ERROR");

    // redelivery succeeds
    let (status, _) = send(&app.router, webhook(&payload, Some(&signature))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn gate_reload_failure_after_payment_is_5xx_until_redelivered() {
    let app = test_app();
    let payload = deposit_payload(NPUB);
    let signature = compute_signature(SECRET, &payload);
    app.store.fail_snapshot_next(1);

    let (status, body) = send(&app.router, webhook(&payload, Some(&signature))).await;

    assert!(status.is_server_error());
    assert_eq!(body["code"], "PERSISTENCE_ERROR");
    assert_eq!(app.store.len().await, 1);
    assert!(app.gate.authorize(HEX).is_err());

    let (status, body) = send(&app.router, webhook(&payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Subscription activated");
    assert_eq!(app.gate.authorize(HEX), Ok(()));
}

#[tokio::test]
async fn deposit_with_undecodable_identity_is_400() {
    let app = test_app();
    let payload = deposit_payload("npub1notarealkey");
    let signature = compute_signature(SECRET, &payload);

    let (status, body) = send(&app.router, webhook(&payload, Some(&signature))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_IDENTITY");
    assert!(app.store.is_empty().await);
    assert_eq!(app.gate.version(), 0);
}

// =============================================================================
// /poll_payment, /info, /health
// =============================================================================

#[tokio::test]
async fn poll_unknown_identity_is_inactive() {
    let app = test_app();

    let (status, body) = send(&app.router, post_json("/poll_payment", json!({"npub": NPUB}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment status");
    assert_eq!(body["data"]["active"], false);
}

#[tokio::test]
async fn poll_after_payment_is_active() {
    let app = test_app();
    let payload = deposit_payload(NPUB);
    let signature = compute_signature(SECRET, &payload);
    send(&app.router, webhook(&payload, Some(&signature))).await;

    let (_, body) = send(&app.router, post_json("/poll_payment", json!({"npub": NPUB}))).await;

    assert_eq!(body["data"]["active"], true);
}

#[tokio::test]
async fn poll_with_non_json_body_is_400() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/poll_payment")
        .body(Body::from("npub=abc"))
        .unwrap();

    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn info_reports_relay_and_price() {
    let app = test_app();
    let request = Request::builder().uri("/info").body(Body::empty()).unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Paid Relay");
    assert_eq!(body["data"]["price_per_year"], 21000.0);
    assert_eq!(body["data"]["currency"], "sats");
}

#[tokio::test]
async fn health_reports_gate_version() {
    let app = test_app();
    app.gate.reload().await.unwrap();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["gate_version"], 1);
    assert_eq!(body["authorized_keys"], 0);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = test_app();
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();

    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
