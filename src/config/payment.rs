//! Payment configuration (Bitvora)

use serde::Deserialize;

use super::error::ValidationError;

/// Payment processor and pricing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Bitvora API key
    pub api_key: String,

    /// Shared secret for notification signatures
    pub webhook_secret: String,

    /// Base URL of the Bitvora API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Price of one year, in `currency` units
    pub price_per_year: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_invoice_description")]
    pub invoice_description: String,

    /// Seconds until an unpaid invoice expires
    #[serde(default = "default_invoice_expiry")]
    pub invoice_expiry_secs: u64,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_API_KEY"));
        }
        if self.webhook_secret.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT_WEBHOOK_SECRET"));
        }
        if !self.price_per_year.is_finite() || self.price_per_year <= 0.0 {
            return Err(ValidationError::InvalidPrice);
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidPaymentApiUrl);
        }
        if self.invoice_expiry_secs == 0 {
            return Err(ValidationError::InvalidInvoiceExpiry);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            webhook_secret: String::new(),
            api_base_url: default_api_base_url(),
            price_per_year: 0.0,
            currency: default_currency(),
            invoice_description: default_invoice_description(),
            invoice_expiry_secs: default_invoice_expiry(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.bitvora.com".to_string()
}

fn default_currency() -> String {
    "sats".to_string()
}

fn default_invoice_description() -> String {
    "1 year subscription".to_string()
}

fn default_invoice_expiry() -> u64 {
    3600
}
