//! Data Transfer Objects for subscription HTTP endpoints.
//!
//! Success bodies use the `{status, message, data}` envelope the relay's web
//! client expects. Errors add a machine-readable `code`.

use serde::{Deserialize, Serialize};

use crate::domain::subscription::SubscriptionError;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `/generate_invoice` and `/poll_payment`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityRequest {
    #[serde(default, alias = "identity")]
    pub npub: String,
}

impl IdentityRequest {
    /// Parses a raw body so syntax errors map to a 400 with our error body
    /// rather than the extractor's plain-text rejection.
    pub fn from_body(body: &[u8]) -> Result<Self, SubscriptionError> {
        serde_json::from_slice(body)
            .map_err(|e| SubscriptionError::malformed(format!("Missing or invalid npub: {}", e)))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Standard success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// HTTP status code, repeated in the body.
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub invoice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub active: bool,
}

/// Presentation metadata for the relay landing page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelayInfoResponse {
    pub name: String,
    pub description: String,
    pub pubkey: String,
    pub icon: String,
    pub contact: String,
    pub url: String,
    pub price_per_year: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub gate_version: u64,
    pub authorized_keys: usize,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }
}
