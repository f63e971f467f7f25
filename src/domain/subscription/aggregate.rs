//! Subscription record.
//!
//! One record per canonical key. Created pending when an invoice is first
//! requested, activated by a verified payment and expired by the sweeper.
//!
//! # Invariants
//!
//! - `canonical_key` never changes once the record exists
//! - `active` implies `paid_at` and `expires_at` are set
//! - every payment sets `expires_at = paid_at + 1 year`, whatever came before

use crate::domain::foundation::{StateMachine, Timestamp, TransitionError};
use serde::{Deserialize, Serialize};

use super::{CanonicalKey, EncodedIdentity, SubscriptionStatus};

/// Length of the period bought by one payment.
pub const SUBSCRIPTION_PERIOD_YEARS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Primary key, derived from `encoded_identity`.
    pub canonical_key: CanonicalKey,

    /// The npub the subscriber presented.
    pub encoded_identity: EncodedIdentity,

    /// Whether writes are currently allowed.
    pub active: bool,

    /// Most recent successful payment.
    pub paid_at: Option<Timestamp>,

    /// End of the paid period.
    pub expires_at: Option<Timestamp>,
}

impl Subscription {
    /// Creates a record awaiting its first payment.
    pub fn pending(canonical_key: CanonicalKey, encoded_identity: EncodedIdentity) -> Self {
        Self {
            canonical_key,
            encoded_identity,
            active: false,
            paid_at: None,
            expires_at: None,
        }
    }

    pub fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus::derive(self.active, self.paid_at)
    }

    /// Applies a verified payment.
    ///
    /// Valid from every status. The paid period always restarts at `paid_at`;
    /// time left on a still-active subscription is not carried over.
    pub fn record_payment(&mut self, paid_at: Timestamp) {
        debug_assert!(self.status().can_transition_to(&SubscriptionStatus::Active));
        self.active = true;
        self.paid_at = Some(paid_at);
        self.expires_at = Some(paid_at.add_years(SUBSCRIPTION_PERIOD_YEARS));
    }

    /// True when the sweeper should demote this record at `now`.
    pub fn is_lapsed(&self, now: &Timestamp) -> bool {
        self.active && self.expires_at.is_some_and(|expires_at| expires_at.is_before(now))
    }

    /// Demotes an active record.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` for records that are not active.
    pub fn expire(&mut self) -> Result<(), TransitionError> {
        self.status().transition_to(SubscriptionStatus::Expired)?;
        self.active = false;
        Ok(())
    }
}
