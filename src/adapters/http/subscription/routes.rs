//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    bitvora_webhook, generate_invoice, health, poll_payment, relay_info, SubscriptionAppState,
};

/// Create the subscription router.
///
/// # Routes
///
/// ## Client Endpoints
/// - `POST /generate_invoice` - Pending subscription plus Lightning invoice
/// - `POST /poll_payment` - Whether the subscription is active
/// - `GET /info` - Relay presentation metadata and price
///
/// ## Webhook Endpoints (no auth, signature verified)
/// - `POST /bitvora_webhook` - Payment processor notifications
///
/// ## Operations
/// - `GET /health` - Liveness and gate snapshot version
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/generate_invoice", post(generate_invoice))
        .route("/poll_payment", post(poll_payment))
        .route("/info", get(relay_info))
        .route("/bitvora_webhook", post(bitvora_webhook))
        .route("/health", get(health))
}
