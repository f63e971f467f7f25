//! PostgreSQL implementation of SubscriptionStore.
//!
//! One row per canonical key in the `subscriptions` table. Transient
//! failures (serialization conflicts, lock timeouts, pool exhaustion) are
//! retried a bounded number of times before surfacing as `Persistence`.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{CanonicalKey, EncodedIdentity, Subscription, SubscriptionError};
use crate::ports::{CreateOutcome, SubscriptionStore};

const DEFAULT_BUSY_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// SQLSTATE codes worth retrying.
const TRANSIENT_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "53300", // too_many_connections
];

pub struct PostgresSubscriptionStore {
    pool: PgPool,
    busy_retries: u32,
    retry_backoff: Duration,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            busy_retries: DEFAULT_BUSY_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Overrides how many times a transient failure is retried.
    pub fn with_busy_retries(mut self, retries: u32) -> Self {
        self.busy_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, mut run: F) -> Result<T, SubscriptionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut attempt = 0;
        loop {
            match run().await {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < self.busy_retries => {
                    attempt += 1;
                    tracing::debug!(operation, attempt, error = %e, "Transient store error, retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    tracing::error!(operation, error = %e, "Subscription store operation failed");
                    return Err(SubscriptionError::persistence(format!("{}: {}", operation, e)));
                }
            }
        }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    pubkey: String,
    npub: String,
    active: bool,
    paid_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = SubscriptionError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let canonical_key = CanonicalKey::parse(&row.pubkey)
            .map_err(|e| SubscriptionError::persistence(format!("Invalid stored pubkey: {}", e)))?;
        let encoded_identity = EncodedIdentity::new(row.npub)
            .map_err(|e| SubscriptionError::persistence(format!("Invalid stored npub: {}", e)))?;

        Ok(Subscription {
            canonical_key,
            encoded_identity,
            active: row.active,
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            expires_at: row.expires_at.map(Timestamp::from_datetime),
        })
    }
}

fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref()))
            .unwrap_or(false),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        _ => false,
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn create(&self, identity: &EncodedIdentity) -> Result<CreateOutcome, SubscriptionError> {
        let key = identity.canonical_key()?;

        let result = self
            .with_retry("create", || {
                sqlx::query(
                    r#"
                    INSERT INTO subscriptions (pubkey, npub, active)
                    VALUES ($1, $2, false)
                    ON CONFLICT (pubkey) DO NOTHING
                    "#,
                )
                .bind(key.as_str())
                .bind(identity.as_str())
                .execute(&self.pool)
            })
            .await?;

        if result.rows_affected() == 0 {
            Ok(CreateOutcome::AlreadyExists)
        } else {
            Ok(CreateOutcome::Created)
        }
    }

    async fn mark_paid(
        &self,
        identity: &EncodedIdentity,
        paid_at: Timestamp,
    ) -> Result<Subscription, SubscriptionError> {
        let key = identity.canonical_key()?;
        let mut subscription = Subscription::pending(key, identity.clone());
        subscription.record_payment(paid_at);

        let paid_at = subscription.paid_at.map(|t| *t.as_datetime());
        let expires_at = subscription.expires_at.map(|t| *t.as_datetime());

        self.with_retry("mark_paid", || {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (pubkey, npub, active, paid_at, expires_at)
                VALUES ($1, $2, true, $3, $4)
                ON CONFLICT (pubkey) DO UPDATE SET
                    npub = EXCLUDED.npub,
                    active = true,
                    paid_at = EXCLUDED.paid_at,
                    expires_at = EXCLUDED.expires_at
                "#,
            )
            .bind(subscription.canonical_key.as_str())
            .bind(subscription.encoded_identity.as_str())
            .bind(paid_at)
            .bind(expires_at)
            .execute(&self.pool)
        })
        .await?;

        Ok(subscription)
    }

    async fn is_active(&self, identity: &EncodedIdentity) -> Result<bool, SubscriptionError> {
        let key = identity.canonical_key()?;

        let active: Option<bool> = self
            .with_retry("is_active", || {
                sqlx::query_scalar("SELECT active FROM subscriptions WHERE pubkey = $1")
                    .bind(key.as_str())
                    .fetch_optional(&self.pool)
            })
            .await?;

        Ok(active.unwrap_or(false))
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<u64, SubscriptionError> {
        let now = *now.as_datetime();

        let result = self
            .with_retry("sweep_expired", || {
                sqlx::query(
                    r#"
                    UPDATE subscriptions
                    SET active = false
                    WHERE active = true
                      AND expires_at IS NOT NULL
                      AND expires_at < $1
                    "#,
                )
                .bind(now)
                .execute(&self.pool)
            })
            .await?;

        Ok(result.rows_affected())
    }

    async fn snapshot_active_keys(&self) -> Result<HashSet<CanonicalKey>, SubscriptionError> {
        let rows: Vec<String> = self
            .with_retry("snapshot_active_keys", || {
                sqlx::query_scalar("SELECT pubkey FROM subscriptions WHERE active = true")
                    .fetch_all(&self.pool)
            })
            .await?;

        let mut keys = HashSet::with_capacity(rows.len());
        for pubkey in rows {
            match CanonicalKey::parse(&pubkey) {
                Ok(key) => {
                    keys.insert(key);
                }
                Err(e) => {
                    tracing::warn!(pubkey = %pubkey, error = %e, "Skipping malformed stored pubkey");
                }
            }
        }
        Ok(keys)
    }

    async fn find(&self, key: &CanonicalKey) -> Result<Option<Subscription>, SubscriptionError> {
        let row: Option<SubscriptionRow> = self
            .with_retry("find", || {
                sqlx::query_as(
                    r#"
                    SELECT pubkey, npub, active, paid_at, expires_at
                    FROM subscriptions
                    WHERE pubkey = $1
                    "#,
                )
                .bind(key.as_str())
                .fetch_optional(&self.pool)
            })
            .await?;

        row.map(Subscription::try_from).transpose()
    }
}
