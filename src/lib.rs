//! Aegis - Paid-subscription write gate for a Nostr relay and blob server
//!
//! Subscribers pay a Lightning invoice; a signed payment notification marks
//! them active and rebuilds the in-memory allow list the relay and blob
//! server consult on every write. A background sweeper demotes lapsed
//! subscriptions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
