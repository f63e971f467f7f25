//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::application::handlers::subscription::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, InvoiceSettings,
    NotificationOutcome, PollStatusHandler, PollStatusQuery, RequestInvoiceCommand,
    RequestInvoiceHandler,
};
use crate::application::AuthorizationGate;
use crate::domain::subscription::{PaymentNotificationVerifier, SubscriptionError, SIGNATURE_HEADER};
use crate::ports::{InvoiceProvider, SubscriptionStore};

use super::dto::{
    ApiResponse, ErrorResponse, HealthResponse, IdentityRequest, InvoiceResponse,
    PaymentStatusResponse, RelayInfoResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub store: Arc<dyn SubscriptionStore>,
    pub invoice_provider: Arc<dyn InvoiceProvider>,
    pub gate: Arc<AuthorizationGate>,
    pub verifier: PaymentNotificationVerifier,
    pub invoice_settings: InvoiceSettings,
    pub store_timeout: Duration,
    pub relay_info: Arc<RelayInfoResponse>,
}

impl SubscriptionAppState {
    /// Create handlers on demand from the shared state.
    pub fn request_invoice_handler(&self) -> RequestInvoiceHandler {
        RequestInvoiceHandler::new(
            self.store.clone(),
            self.invoice_provider.clone(),
            self.invoice_settings.clone(),
        )
        .with_store_timeout(self.store_timeout)
    }

    pub fn notification_handler(&self) -> HandlePaymentNotificationHandler {
        HandlePaymentNotificationHandler::new(
            self.store.clone(),
            self.gate.clone(),
            self.verifier.clone(),
        )
        .with_store_timeout(self.store_timeout)
    }

    pub fn poll_status_handler(&self) -> PollStatusHandler {
        PollStatusHandler::new(self.store.clone()).with_store_timeout(self.store_timeout)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /generate_invoice - Create a pending subscription and a Lightning invoice
pub async fn generate_invoice(
    State(state): State<SubscriptionAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let request = IdentityRequest::from_body(&body)?;

    let handler = state.request_invoice_handler();
    let cmd = RequestInvoiceCommand {
        identity: request.npub,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(ApiResponse::ok(
        "Invoice generated",
        InvoiceResponse {
            invoice: result.invoice,
        },
    )))
}

/// POST /bitvora_webhook - Handle payment processor notifications
///
/// The body is taken as raw bytes; the signature covers them exactly.
pub async fn bitvora_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let handler = state.notification_handler();
    let cmd = HandlePaymentNotificationCommand {
        payload: body.to_vec(),
        signature,
    };

    let message = match handler.handle(cmd).await? {
        NotificationOutcome::SubscriptionActivated { .. } => "Subscription activated",
        NotificationOutcome::AcknowledgedWithoutIdentity { .. } => "Notification acknowledged",
        NotificationOutcome::Ignored { .. } => "Event ignored",
    };

    Ok(Json(ApiResponse::ok_empty(message)))
}

/// POST /poll_payment - Check whether a subscription is active
pub async fn poll_payment(
    State(state): State<SubscriptionAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let request = IdentityRequest::from_body(&body)?;

    let handler = state.poll_status_handler();
    let query = PollStatusQuery {
        identity: request.npub,
    };

    let result = handler.handle(query).await?;

    Ok(Json(ApiResponse::ok(
        "Payment status",
        PaymentStatusResponse {
            active: result.active,
        },
    )))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /info - Relay name, description and price
pub async fn relay_info(State(state): State<SubscriptionAppState>) -> impl IntoResponse {
    Json(ApiResponse::ok("Relay info", (*state.relay_info).clone()))
}

/// GET /health - Liveness plus the current gate snapshot
pub async fn health(State(state): State<SubscriptionAppState>) -> impl IntoResponse {
    let snapshot = state.gate.snapshot();
    Json(HealthResponse {
        status: "ok",
        gate_version: snapshot.version(),
        authorized_keys: snapshot.len(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts subscription errors to HTTP responses.
#[derive(Debug)]
pub struct SubscriptionApiError(SubscriptionError);

impl From<SubscriptionError> for SubscriptionApiError {
    fn from(err: SubscriptionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();

        // Server-side details stay in the logs
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "Request failed");
            match &self.0 {
                SubscriptionError::InvoiceProvider(_) => "Error creating invoice".to_string(),
                SubscriptionError::StoreTimeout(_) => "Service temporarily unavailable".to_string(),
                _ => "Internal error".to_string(),
            }
        } else {
            self.0.to_string()
        };

        let body = ErrorResponse::new(status.as_u16(), self.0.code(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_errors_expose_their_message() {
        let response = SubscriptionApiError::from(SubscriptionError::Unauthenticated).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_SIGNATURE");
        assert_eq!(json["message"], "Invalid signature");
        assert_eq!(json["status"], 401);
    }

    #[tokio::test]
    async fn server_errors_hide_internal_detail() {
        let response =
            SubscriptionApiError::from(SubscriptionError::persistence("connection refused on 10.0.0.3"))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "PERSISTENCE_ERROR");
        assert_eq!(json["message"], "Internal error");
    }

    #[tokio::test]
    async fn invoice_failure_is_bad_gateway() {
        let response = SubscriptionApiError::from(SubscriptionError::InvoiceProvider("down".into()))
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["message"], "Error creating invoice");
    }
}
