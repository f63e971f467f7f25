//! Bitvora invoice adapter.
//!
//! Implements `InvoiceProvider` with a single bearer-authenticated JSON POST
//! to the Lightning invoice endpoint.
//!
//! ```ignore
//! let config = BitvoraConfig::new(api_key);
//! let adapter = BitvoraInvoiceAdapter::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::ports::{CreateInvoiceRequest, Invoice, InvoiceError, InvoiceProvider};

pub const DEFAULT_API_BASE_URL: &str = "https://api.bitvora.com";

const LIGHTNING_INVOICE_PATH: &str = "/v1/bitcoin/deposit/lightning-invoice";

/// Bitvora API configuration.
#[derive(Clone)]
pub struct BitvoraConfig {
    api_key: SecretString,
    api_base_url: String,
}

impl BitvoraConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn invoice_url(&self) -> String {
        format!("{}{}", self.api_base_url, LIGHTNING_INVOICE_PATH)
    }
}

#[derive(Debug, Serialize)]
struct LightningInvoiceBody<'a> {
    amount: f64,
    currency: &'a str,
    description: &'a str,
    expiry_seconds: u64,
    metadata: &'a std::collections::HashMap<String, String>,
}

impl<'a> From<&'a CreateInvoiceRequest> for LightningInvoiceBody<'a> {
    fn from(request: &'a CreateInvoiceRequest) -> Self {
        Self {
            amount: request.amount,
            currency: &request.currency,
            description: &request.description,
            expiry_seconds: request.expiry_secs,
            metadata: &request.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LightningInvoiceResponse {
    data: Option<LightningInvoiceData>,
}

#[derive(Debug, Deserialize)]
struct LightningInvoiceData {
    id: String,
    payment_request: String,
}

fn parse_invoice(body: &[u8]) -> Result<Invoice, InvoiceError> {
    let response: LightningInvoiceResponse = serde_json::from_slice(body)
        .map_err(|e| InvoiceError::InvalidResponse(format!("Failed to parse Bitvora response: {}", e)))?;

    let data = response
        .data
        .ok_or_else(|| InvoiceError::InvalidResponse("Response has no data".to_string()))?;

    if data.payment_request.trim().is_empty() {
        return Err(InvoiceError::InvalidResponse(
            "Response has an empty payment request".to_string(),
        ));
    }

    Ok(Invoice {
        id: data.id,
        payment_request: data.payment_request,
    })
}

pub struct BitvoraInvoiceAdapter {
    config: BitvoraConfig,
    http_client: reqwest::Client,
}

impl BitvoraInvoiceAdapter {
    pub fn new(config: BitvoraConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InvoiceProvider for BitvoraInvoiceAdapter {
    async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice, InvoiceError> {
        let response = self
            .http_client
            .post(self.config.invoice_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&LightningInvoiceBody::from(&request))
            .send()
            .await
            .map_err(|e| InvoiceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Bitvora create_invoice failed");
            return Err(InvoiceError::Provider {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| InvoiceError::Network(e.to_string()))?;
        let invoice = parse_invoice(&body)?;

        tracing::debug!(invoice_id = %invoice.id, "Lightning invoice created");
        Ok(invoice)
    }
}
