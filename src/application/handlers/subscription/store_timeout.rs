//! Bounded store calls for request handlers.

use std::future::Future;
use std::time::Duration;

use crate::domain::subscription::SubscriptionError;

/// Default bound on a single store call made while serving a request.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Awaits `operation`, failing with `StoreTimeout` if it takes longer than `limit`.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, SubscriptionError>
where
    F: Future<Output = Result<T, SubscriptionError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(SubscriptionError::StoreTimeout(limit)),
    }
}
