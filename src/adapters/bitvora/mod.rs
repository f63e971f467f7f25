//! Bitvora payment processor adapters.
//!
//! - `BitvoraInvoiceAdapter` - creates Lightning invoices over the HTTP API
//! - `MockInvoiceProvider` - in-process stand-in for tests and local runs

mod invoice_adapter;
mod mock_invoice_provider;

pub use invoice_adapter::{BitvoraConfig, BitvoraInvoiceAdapter, DEFAULT_API_BASE_URL};
pub use mock_invoice_provider::MockInvoiceProvider;
