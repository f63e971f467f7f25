//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - durable subscription store
//! - `memory` - in-process subscription store for tests and local runs
//! - `bitvora` - invoice creation at the payment processor
//! - `relay` - write hooks for the event relay and blob server
//! - `http` - REST endpoints

pub mod bitvora;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod relay;

pub use bitvora::{BitvoraConfig, BitvoraInvoiceAdapter, MockInvoiceProvider};
pub use memory::InMemorySubscriptionStore;
pub use postgres::PostgresSubscriptionStore;
pub use relay::{BlobUploadPolicy, EventWritePolicy, UploadVerdict};
