//! In-Memory Subscription Store Adapter
//!
//! Keeps subscriptions in a map keyed by canonical key.
//! Useful for testing and local development without PostgreSQL.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{CanonicalKey, EncodedIdentity, Subscription, SubscriptionError};
use crate::ports::{CreateOutcome, SubscriptionStore};

/// In-memory storage for subscriptions
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<HashMap<CanonicalKey, Subscription>>>,
    injected_failures: Arc<AtomicUsize>,
    snapshot_failures: Arc<AtomicUsize>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` operations fail with a persistence error.
    pub fn fail_next(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` calls to `snapshot_active_keys` fail while
    /// every other operation keeps working.
    pub fn fail_snapshot_next(&self, count: usize) {
        self.snapshot_failures.store(count, Ordering::SeqCst);
    }

    /// Seeds a record directly, replacing any existing one.
    pub async fn insert(&self, subscription: Subscription) {
        self.records
            .write()
            .await
            .insert(subscription.canonical_key.clone(), subscription);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_injected_failure(&self) -> Result<(), SubscriptionError> {
        Self::consume(&self.injected_failures)
    }

    fn consume(counter: &AtomicUsize) -> Result<(), SubscriptionError> {
        let consumed = counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(SubscriptionError::persistence("injected store failure")),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn create(&self, identity: &EncodedIdentity) -> Result<CreateOutcome, SubscriptionError> {
        let key = identity.canonical_key()?;
        self.check_injected_failure()?;

        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        records.insert(key.clone(), Subscription::pending(key, identity.clone()));
        Ok(CreateOutcome::Created)
    }

    async fn mark_paid(
        &self,
        identity: &EncodedIdentity,
        paid_at: Timestamp,
    ) -> Result<Subscription, SubscriptionError> {
        let key = identity.canonical_key()?;
        self.check_injected_failure()?;

        let mut records = self.records.write().await;
        let record = records
            .entry(key.clone())
            .or_insert_with(|| Subscription::pending(key, identity.clone()));
        record.record_payment(paid_at);
        Ok(record.clone())
    }

    async fn is_active(&self, identity: &EncodedIdentity) -> Result<bool, SubscriptionError> {
        let key = identity.canonical_key()?;
        self.check_injected_failure()?;

        Ok(self
            .records
            .read()
            .await
            .get(&key)
            .map(|record| record.active)
            .unwrap_or(false))
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, SubscriptionError> {
        self.check_injected_failure()?;

        let mut records = self.records.write().await;
        let mut demoted = 0;
        for record in records.values_mut().filter(|r| r.is_lapsed(&now)) {
            record
                .expire()
                .map_err(|e| SubscriptionError::persistence(e.to_string()))?;
            demoted += 1;
        }
        Ok(demoted)
    }

    async fn snapshot_active_keys(&self) -> Result<HashSet<CanonicalKey>, SubscriptionError> {
        self.check_injected_failure()?;
        Self::consume(&self.snapshot_failures)?;

        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.active)
            .map(|record| record.canonical_key.clone())
            .collect())
    }

    async fn find(&self, key: &CanonicalKey) -> Result<Option<Subscription>, SubscriptionError> {
        self.check_injected_failure()?;
        Ok(self.records.read().await.get(key).cloned())
    }
}
