//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (timestamps, state machine trait)
//! - `subscription` - Subscriber identity, subscription lifecycle and
//!   payment notification authentication

pub mod foundation;
pub mod subscription;
