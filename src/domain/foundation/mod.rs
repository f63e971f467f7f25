//! Foundation module - Shared domain primitives.

mod state_machine;
mod timestamp;

pub use state_machine::{StateMachine, TransitionError};
pub use timestamp::Timestamp;
