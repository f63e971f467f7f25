//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod subscription;

pub use subscription::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, InvoiceSettings,
    NotificationOutcome, PollStatusHandler, PollStatusQuery, PollStatusResult,
    RequestInvoiceCommand, RequestInvoiceHandler, RequestInvoiceResult, DEFAULT_STORE_TIMEOUT,
};
