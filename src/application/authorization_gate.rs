//! AuthorizationGate - in-memory allow list consulted on every write.
//!
//! The gate holds one immutable [`GateSnapshot`] behind an `Arc`. Readers clone
//! the `Arc` under a short read lock and check membership without any lock.
//! A reload builds a fresh snapshot from the store and swaps the pointer.
//!
//! # Concurrent reloads
//!
//! Each reload takes its version before reading the store and only publishes
//! if the currently published snapshot is older. The reload that started last
//! wins, so a slow read can never overwrite a newer one.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{CanonicalKey, SubscriptionError};
use crate::ports::SubscriptionStore;

/// Immutable set of authorized canonical keys.
#[derive(Debug, Clone)]
pub struct GateSnapshot {
    version: u64,
    keys: HashSet<CanonicalKey>,
    built_at: Timestamp,
}

impl GateSnapshot {
    fn empty() -> Self {
        Self {
            version: 0,
            keys: HashSet::new(),
            built_at: Timestamp::now(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> Timestamp {
        self.built_at
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Why a write was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("no pubkey")]
    MissingKey,

    #[error("invalid pubkey")]
    MalformedKey,

    #[error("pubkey not whitelisted")]
    NotSubscribed,
}

pub struct AuthorizationGate {
    store: Arc<dyn SubscriptionStore>,
    current: RwLock<Arc<GateSnapshot>>,
    next_version: AtomicU64,
}

impl AuthorizationGate {
    /// Creates a gate with an empty snapshot. Nothing is authorized until the
    /// first [`reload`](Self::reload).
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(GateSnapshot::empty())),
            next_version: AtomicU64::new(0),
        }
    }

    /// Checks a hex public key against the current snapshot.
    pub fn authorize(&self, pubkey: &str) -> Result<(), GateRejection> {
        let pubkey = pubkey.trim();
        if pubkey.is_empty() {
            return Err(GateRejection::MissingKey);
        }

        let key = CanonicalKey::parse(pubkey).map_err(|_| GateRejection::MalformedKey)?;

        if self.snapshot().contains(&key) {
            Ok(())
        } else {
            Err(GateRejection::NotSubscribed)
        }
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<GateSnapshot> {
        // The lock only guards a pointer swap; a poisoned lock still holds a
        // complete snapshot.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Version of the currently published snapshot.
    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Rebuilds the snapshot from the store and publishes it.
    ///
    /// Returns the version this reload built. When a newer reload has already
    /// published, the result is discarded and the current snapshot stays.
    ///
    /// # Errors
    ///
    /// Propagates the store error; the previous snapshot stays published.
    pub async fn reload(&self) -> Result<u64, SubscriptionError> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;

        let keys = self.store.snapshot_active_keys().await.map_err(|e| {
            tracing::error!(version, error = %e, "Gate reload failed, keeping previous snapshot");
            e
        })?;

        let snapshot = Arc::new(GateSnapshot {
            version,
            keys,
            built_at: Timestamp::now(),
        });
        let size = snapshot.len();

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.version < version {
            *current = snapshot;
            drop(current);
            tracing::info!(version, authorized_keys = size, "Authorization gate reloaded");
        } else {
            let published = current.version;
            drop(current);
            tracing::debug!(version, published, "Gate reload superseded by a newer snapshot");
        }

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::subscription::{EncodedIdentity, Subscription};
    use crate::ports::CreateOutcome;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    const NPUB_A: &str = "npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6";
    const HEX_A: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
    const HEX_B: &str = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";

    fn key(hex: &str) -> CanonicalKey {
        CanonicalKey::parse(hex).unwrap()
    }

    async fn gate_with_paid(npubs: &[&str]) -> (AuthorizationGate, InMemorySubscriptionStore) {
        let store = InMemorySubscriptionStore::new();
        for npub in npubs {
            let identity = EncodedIdentity::new(*npub).unwrap();
            store.mark_paid(&identity, Timestamp::now()).await.unwrap();
        }
        (AuthorizationGate::new(Arc::new(store.clone())), store)
    }

    /// Store whose snapshot reads are answered from a script, optionally
    /// blocking until released.
    struct ScriptedStore {
        responses: Mutex<VecDeque<(HashSet<CanonicalKey>, Option<oneshot::Receiver<()>>)>>,
    }

    impl ScriptedStore {
        fn remaining(&self) -> usize {
            self.responses.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SubscriptionStore for ScriptedStore {
        async fn create(&self, _: &EncodedIdentity) -> Result<CreateOutcome, SubscriptionError> {
            unimplemented!()
        }
        async fn mark_paid(&self, _: &EncodedIdentity, _: Timestamp) -> Result<Subscription, SubscriptionError> {
            unimplemented!()
        }
        async fn is_active(&self, _: &EncodedIdentity) -> Result<bool, SubscriptionError> {
            unimplemented!()
        }
        async fn sweep_expired(&self, _: Timestamp) -> Result<u64, SubscriptionError> {
            unimplemented!()
        }
        async fn snapshot_active_keys(&self) -> Result<HashSet<CanonicalKey>, SubscriptionError> {
            let (keys, wait) = self.responses.lock().unwrap().pop_front().unwrap();
            if let Some(release) = wait {
                let _ = release.await;
            }
            Ok(keys)
        }
        async fn find(&self, _: &CanonicalKey) -> Result<Option<Subscription>, SubscriptionError> {
            unimplemented!()
        }
    }

    // ══════════════════════════════════════════════════════════════
    // authorize
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn nothing_is_authorized_before_first_reload() {
        let (gate, _) = gate_with_paid(&[NPUB_A]).await;

        assert_eq!(gate.version(), 0);
        assert_eq!(gate.authorize(HEX_A), Err(GateRejection::NotSubscribed));
    }

    #[tokio::test]
    async fn authorize_after_reload_permits_active_keys_only() {
        let (gate, _) = gate_with_paid(&[NPUB_A]).await;
        gate.reload().await.unwrap();

        assert_eq!(gate.authorize(HEX_A), Ok(()));
        assert_eq!(gate.authorize(&HEX_A.to_uppercase()), Ok(()));
        assert_eq!(gate.authorize(HEX_B), Err(GateRejection::NotSubscribed));
    }

    #[tokio::test]
    async fn authorize_rejects_empty_and_malformed_keys() {
        let (gate, _) = gate_with_paid(&[NPUB_A]).await;
        gate.reload().await.unwrap();

        assert_eq!(gate.authorize(""), Err(GateRejection::MissingKey));
        assert_eq!(gate.authorize("   "), Err(GateRejection::MissingKey));
        assert_eq!(gate.authorize("abc123"), Err(GateRejection::MalformedKey));
        assert_eq!(gate.authorize(NPUB_A), Err(GateRejection::MalformedKey));
    }

    #[test]
    fn rejection_messages_match_relay_wording() {
        assert_eq!(GateRejection::MissingKey.to_string(), "no pubkey");
        assert_eq!(GateRejection::NotSubscribed.to_string(), "pubkey not whitelisted");
    }

    // ══════════════════════════════════════════════════════════════
    // reload
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn reload_matches_store_exactly() {
        let (gate, store) = gate_with_paid(&[NPUB_A]).await;
        let pending = key(HEX_B).to_encoded_identity().unwrap();
        store.create(&pending).await.unwrap();

        gate.reload().await.unwrap();

        let expected = store.snapshot_active_keys().await.unwrap();
        let snapshot = gate.snapshot();
        assert_eq!(snapshot.len(), expected.len());
        assert!(expected.iter().all(|k| snapshot.contains(k)));
    }

    #[tokio::test]
    async fn reload_increments_version() {
        let (gate, _) = gate_with_paid(&[]).await;

        assert_eq!(gate.reload().await.unwrap(), 1);
        assert_eq!(gate.reload().await.unwrap(), 2);
        assert_eq!(gate.version(), 2);
    }

    #[tokio::test]
    async fn readers_holding_a_snapshot_keep_it_across_reload() {
        let (gate, store) = gate_with_paid(&[NPUB_A]).await;
        gate.reload().await.unwrap();
        let held = gate.snapshot();

        store.sweep_expired(Timestamp::now().add_years(5)).await.unwrap();
        gate.reload().await.unwrap();

        assert!(held.contains(&key(HEX_A)));
        assert!(!gate.snapshot().contains(&key(HEX_A)));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let (gate, store) = gate_with_paid(&[NPUB_A]).await;
        gate.reload().await.unwrap();
        store.fail_next(1);

        let result = gate.reload().await;

        assert!(matches!(result, Err(SubscriptionError::Persistence(_))));
        assert_eq!(gate.version(), 1);
        assert_eq!(gate.authorize(HEX_A), Ok(()));
    }

    #[tokio::test]
    async fn slow_older_reload_never_overwrites_newer_snapshot() {
        let (release_tx, release_rx) = oneshot::channel();
        let store = Arc::new(ScriptedStore {
            responses: Mutex::new(VecDeque::from([
                (HashSet::from([key(HEX_A)]), Some(release_rx)),
                (HashSet::from([key(HEX_B)]), None),
            ])),
        });
        let gate = Arc::new(AuthorizationGate::new(store.clone()));

        let slow = tokio::spawn({
            let gate = gate.clone();
            async move { gate.reload().await }
        });
        while store.remaining() > 1 {
            tokio::task::yield_now().await;
        }

        assert_eq!(gate.reload().await.unwrap(), 2);
        release_tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), 1);

        let snapshot = gate.snapshot();
        assert_eq!(snapshot.version(), 2);
        assert!(snapshot.contains(&key(HEX_B)));
        assert!(!snapshot.contains(&key(HEX_A)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_always_see_a_complete_snapshot() {
        let (gate, _) = gate_with_paid(&[NPUB_A]).await;
        let gate = Arc::new(gate);
        gate.reload().await.unwrap();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    for _ in 0..500 {
                        assert_eq!(gate.authorize(HEX_A), Ok(()));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for _ in 0..50 {
            gate.reload().await.unwrap();
        }
        for reader in readers {
            reader.await.unwrap();
        }
        assert_eq!(gate.version(), 51);
    }
}
