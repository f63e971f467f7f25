//! Invoice provider port.
//!
//! The payment processor creates Lightning invoices on our behalf. The only
//! thing the subscription lifecycle needs from it is a payable invoice string
//! tagged with metadata that comes back in the payment notification.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    /// Creates an invoice and returns its payment request.
    async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice, InvoiceError>;
}

/// Request to create a Lightning invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Amount in `currency` units.
    pub amount: f64,

    /// Currency code understood by the processor (e.g. `sats`).
    pub currency: String,

    /// Human readable description shown in the payer's wallet.
    pub description: String,

    /// Seconds until the invoice stops being payable.
    pub expiry_secs: u64,

    /// Reconciliation metadata echoed back in the payment notification.
    pub metadata: HashMap<String, String>,
}

/// Invoice created by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Processor-side invoice id.
    pub id: String,

    /// BOLT11 payment request handed to the client.
    pub payment_request: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}
