//! Subscription store port.
//!
//! Durable record of one subscription per canonical key. Every operation that
//! takes an [`EncodedIdentity`] derives the canonical key itself and fails with
//! `IdentityDecode` rather than touching storage with an invalid key.
//!
//! # Example
//!
//! ```ignore
//! async fn ensure_pending(store: &dyn SubscriptionStore, npub: &str) -> Result<(), SubscriptionError> {
//!     let identity = EncodedIdentity::new(npub)?;
//!     store.create(&identity).await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{CanonicalKey, EncodedIdentity, Subscription, SubscriptionError};

/// Outcome of [`SubscriptionStore::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new pending record was inserted.
    Created,
    /// A record already existed and was left untouched.
    AlreadyExists,
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts a pending record unless one exists for the same key.
    ///
    /// # Errors
    ///
    /// - `IdentityDecode` if the identity is not a valid npub
    /// - `Persistence` on storage failure
    async fn create(&self, identity: &EncodedIdentity) -> Result<CreateOutcome, SubscriptionError>;

    /// Records a payment: `active = true`, `paid_at`, `expires_at = paid_at + 1y`.
    ///
    /// Applies unconditionally whatever the current status is. A key with no
    /// record is inserted directly as active.
    async fn mark_paid(
        &self,
        identity: &EncodedIdentity,
        paid_at: Timestamp,
    ) -> Result<Subscription, SubscriptionError>;

    /// Current `active` flag. An unknown key is `false`, not an error.
    async fn is_active(&self, identity: &EncodedIdentity) -> Result<bool, SubscriptionError>;

    /// Sets `active = false` on every active record whose `expires_at < now`.
    ///
    /// Returns the number of records demoted. Pending records have no
    /// `expires_at` and are never touched.
    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, SubscriptionError>;

    /// All canonical keys that are currently active.
    async fn snapshot_active_keys(&self) -> Result<HashSet<CanonicalKey>, SubscriptionError>;

    /// Fetches a single record.
    async fn find(&self, key: &CanonicalKey) -> Result<Option<Subscription>, SubscriptionError>;
}
