//! Subscription status state machine.
//!
//! The status is not persisted. It is derived from the stored `active` flag
//! and `paid_at` column, see [`SubscriptionStatus::derive`].

use crate::domain::foundation::{StateMachine, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Invoice requested, never paid. No write access.
    Pending,

    /// Paid and not yet swept. Write access.
    Active,

    /// Swept after `expires_at` passed. No write access until paid again.
    Expired,
}

impl SubscriptionStatus {
    /// Derives the status from the persisted columns.
    pub fn derive(active: bool, paid_at: Option<Timestamp>) -> Self {
        match (active, paid_at) {
            (_, None) => SubscriptionStatus::Pending,
            (true, Some(_)) => SubscriptionStatus::Active,
            (false, Some(_)) => SubscriptionStatus::Expired,
        }
    }

    /// Returns true if this status grants write access.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            (Pending, Active)
                | (Active, Active) // Renewal
                | (Active, Expired)
                | (Expired, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Pending => vec![Active],
            Active => vec![Active, Expired],
            Expired => vec![Active],
        }
    }
}
