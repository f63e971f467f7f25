//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionStore` - durable subscription records
//! - `InvoiceProvider` - invoice creation at the payment processor

mod invoice_provider;
mod subscription_store;

pub use invoice_provider::{CreateInvoiceRequest, Invoice, InvoiceError, InvoiceProvider};
pub use subscription_store::{CreateOutcome, SubscriptionStore};
