//! PollStatusHandler - Query handler for client payment polling.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::subscription::{EncodedIdentity, SubscriptionError};
use crate::ports::SubscriptionStore;

use super::store_timeout::{bounded, DEFAULT_STORE_TIMEOUT};

#[derive(Debug, Clone)]
pub struct PollStatusQuery {
    pub identity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStatusResult {
    pub active: bool,
}

pub struct PollStatusHandler {
    store: Arc<dyn SubscriptionStore>,
    store_timeout: Duration,
}

impl PollStatusHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Reads the `active` flag, retrying once on a retryable store error.
    pub async fn handle(&self, query: PollStatusQuery) -> Result<PollStatusResult, SubscriptionError> {
        let identity = EncodedIdentity::new(query.identity)?;

        let active = match bounded(self.store_timeout, self.store.is_active(&identity)).await {
            Ok(active) => active,
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "Status poll failed, retrying once");
                bounded(self.store_timeout, self.store.is_active(&identity)).await?
            }
            Err(e) => return Err(e),
        };

        Ok(PollStatusResult { active })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::foundation::Timestamp;

    const NPUB: &str = "npub180cvv07tjdrrgpa0j7j7tmnyl2yr6yr7l8j4s3evf6u64th6gkwsyjh6w6";

    fn query(identity: &str) -> PollStatusQuery {
        PollStatusQuery {
            identity: identity.to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_identity_polls_false() {
        let handler = PollStatusHandler::new(Arc::new(InMemorySubscriptionStore::new()));

        let result = handler.handle(query(NPUB)).await.unwrap();

        assert!(!result.active);
    }

    #[tokio::test]
    async fn paid_identity_polls_true() {
        let store = InMemorySubscriptionStore::new();
        store
            .mark_paid(&EncodedIdentity::new(NPUB).unwrap(), Timestamp::now())
            .await
            .unwrap();
        let handler = PollStatusHandler::new(Arc::new(store));

        assert!(handler.handle(query(NPUB)).await.unwrap().active);
    }

    #[tokio::test]
    async fn single_transient_failure_is_retried() {
        let store = InMemorySubscriptionStore::new();
        store.fail_next(1);
        let handler = PollStatusHandler::new(Arc::new(store));

        assert!(!handler.handle(query(NPUB)).await.unwrap().active);
    }

    #[tokio::test]
    async fn second_failure_surfaces() {
        let store = InMemorySubscriptionStore::new();
        store.fail_next(2);
        let handler = PollStatusHandler::new(Arc::new(store));

        let result = handler.handle(query(NPUB)).await;

        assert!(matches!(result, Err(SubscriptionError::Persistence(_))));
    }

    #[tokio::test]
    async fn malformed_identity_is_rejected() {
        let handler = PollStatusHandler::new(Arc::new(InMemorySubscriptionStore::new()));

        let result = handler.handle(query("hello")).await;

        assert!(matches!(result, Err(SubscriptionError::IdentityDecode(_))));
    }
}
