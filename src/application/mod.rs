//! Application layer - Commands, Queries, Handlers and background services.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The authorization gate and expiry sweeper live here because both combine
//! the store with in-process state.

mod authorization_gate;
mod expiry_sweeper;
pub mod handlers;

pub use authorization_gate::{AuthorizationGate, GateRejection, GateSnapshot};
pub use expiry_sweeper::{ExpirySweeper, SweepReport, SweeperSettings};
pub use handlers::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, InvoiceSettings,
    NotificationOutcome, PollStatusHandler, PollStatusQuery, PollStatusResult,
    RequestInvoiceCommand, RequestInvoiceHandler, RequestInvoiceResult,
};
