//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresSubscriptionStore` - durable subscription records with
//!   bounded retry on transient errors

mod subscription_store;

pub use subscription_store::PostgresSubscriptionStore;
