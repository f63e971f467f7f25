//! Subscription HTTP adapter - REST endpoints for the subscription lifecycle.

pub mod dto;
mod handlers;
mod routes;

pub use handlers::{SubscriptionApiError, SubscriptionAppState};
pub use routes::subscription_routes;
