//! Subscription error types.
//!
//! Maps each failure to an HTTP status and to the payment processor's retry
//! semantics: 2xx acknowledges, 4xx is final, 5xx triggers redelivery.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::IdentityError;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// Notification signature missing or not matching the shared secret.
    #[error("Invalid signature")]
    Unauthenticated,

    /// Body could not be parsed or lacks a required field.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Encoded identity could not be converted to a canonical key.
    #[error("Invalid identity: {0}")]
    IdentityDecode(#[from] IdentityError),

    /// Store unavailable or query failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Store did not answer within the configured bound.
    #[error("Store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    /// Invoice collaborator failed.
    #[error("Invoice provider error: {0}")]
    InvoiceProvider(String),
}

impl SubscriptionError {
    pub fn persistence(message: impl Into<String>) -> Self {
        SubscriptionError::Persistence(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        SubscriptionError::MalformedInput(message.into())
    }

    /// Returns true if the same operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::Persistence(_) | SubscriptionError::StoreTimeout(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SubscriptionError::MalformedInput(_) | SubscriptionError::IdentityDecode(_) => {
                StatusCode::BAD_REQUEST
            }
            SubscriptionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SubscriptionError::StoreTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            SubscriptionError::InvoiceProvider(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SubscriptionError::Unauthenticated => "INVALID_SIGNATURE",
            SubscriptionError::MalformedInput(_) => "MALFORMED_INPUT",
            SubscriptionError::IdentityDecode(_) => "INVALID_IDENTITY",
            SubscriptionError::Persistence(_) => "PERSISTENCE_ERROR",
            SubscriptionError::StoreTimeout(_) => "STORE_TIMEOUT",
            SubscriptionError::InvoiceProvider(_) => "INVOICE_PROVIDER_ERROR",
        }
    }
}
