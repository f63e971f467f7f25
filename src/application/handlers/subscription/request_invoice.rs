//! RequestInvoiceHandler - Command handler for starting a subscription.
//!
//! Ensures a pending record exists, then asks the payment processor for an
//! invoice tagged with the subscriber's npub so the settlement notification can
//! be matched back to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::subscription::{CanonicalKey, EncodedIdentity, SubscriptionError};
use crate::ports::{CreateInvoiceRequest, CreateOutcome, InvoiceProvider, SubscriptionStore};

use super::store_timeout::{bounded, DEFAULT_STORE_TIMEOUT};

/// Metadata key carrying the subscriber identity on the invoice.
pub const INVOICE_IDENTITY_METADATA_KEY: &str = "npub";

/// Price and presentation of the invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSettings {
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub expiry_secs: u64,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            amount: 0.0,
            currency: "sats".to_string(),
            description: "1 year subscription".to_string(),
            expiry_secs: 3600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestInvoiceCommand {
    /// npub as supplied by the client.
    pub identity: String,
}

#[derive(Debug, Clone)]
pub struct RequestInvoiceResult {
    /// Payable invoice string.
    pub invoice: String,
    pub invoice_id: String,
    pub canonical_key: CanonicalKey,
    /// Whether this request created the pending record.
    pub created: bool,
}

pub struct RequestInvoiceHandler {
    store: Arc<dyn SubscriptionStore>,
    invoice_provider: Arc<dyn InvoiceProvider>,
    settings: InvoiceSettings,
    store_timeout: Duration,
}

impl RequestInvoiceHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        invoice_provider: Arc<dyn InvoiceProvider>,
        settings: InvoiceSettings,
    ) -> Self {
        Self {
            store,
            invoice_provider,
            settings,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub async fn handle(&self, cmd: RequestInvoiceCommand) -> Result<RequestInvoiceResult, SubscriptionError> {
        let identity = EncodedIdentity::new(cmd.identity)?;
        let canonical_key = identity.canonical_key()?;

        // 1. Pending record first so a fast payment always finds its row
        let outcome = bounded(self.store_timeout, self.store.create(&identity)).await?;

        // 2. Invoice tagged with the identity
        let request = CreateInvoiceRequest {
            amount: self.settings.amount,
            currency: self.settings.currency.clone(),
            description: self.settings.description.clone(),
            expiry_secs: self.settings.expiry_secs,
            metadata: HashMap::from([(
                INVOICE_IDENTITY_METADATA_KEY.to_string(),
                identity.as_str().to_string(),
            )]),
        };

        let invoice = self.invoice_provider.create_invoice(request).await.map_err(|e| {
            tracing::error!(canonical_key = %canonical_key, error = %e, "Invoice creation failed");
            SubscriptionError::InvoiceProvider(e.to_string())
        })?;

        tracing::info!(
            canonical_key = %canonical_key,
            invoice_id = %invoice.id,
            new_subscriber = outcome == CreateOutcome::Created,
            "Invoice generated"
        );

        Ok(RequestInvoiceResult {
            invoice: invoice.payment_request,
            invoice_id: invoice.id,
            canonical_key,
            created: outcome == CreateOutcome::Created,
        })
    }
}
