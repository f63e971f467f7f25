//! Subscription lifecycle handlers.
//!
//! - `RequestInvoiceHandler` - pending record plus invoice
//! - `HandlePaymentNotificationHandler` - verified payment activates
//! - `PollStatusHandler` - client polling for activation

mod handle_payment_notification;
mod poll_status;
mod request_invoice;
mod store_timeout;

pub use handle_payment_notification::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, NotificationOutcome,
};
pub use poll_status::{PollStatusHandler, PollStatusQuery, PollStatusResult};
pub use request_invoice::{
    InvoiceSettings, RequestInvoiceCommand, RequestInvoiceHandler, RequestInvoiceResult,
    INVOICE_IDENTITY_METADATA_KEY,
};
pub use store_timeout::DEFAULT_STORE_TIMEOUT;
