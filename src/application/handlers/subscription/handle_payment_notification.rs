//! HandlePaymentNotificationHandler - Command handler for payment processor
//! notifications.
//!
//! The signature over the raw body is checked before anything is parsed. A
//! settled deposit marks the subscription paid and rebuilds the authorization
//! gate; both finish before the handler returns so the processor only sees a
//! 2xx once the subscriber can write. A reload failure after the payment was
//! recorded is returned as a retryable error; the redelivery re-applies the
//! payment and reloads again.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    CanonicalKey, EncodedIdentity, NotificationKind, PaymentNotification,
    PaymentNotificationVerifier, SubscriptionError,
};
use crate::application::AuthorizationGate;
use crate::ports::SubscriptionStore;

use super::store_timeout::{bounded, DEFAULT_STORE_TIMEOUT};

#[derive(Debug, Clone)]
pub struct HandlePaymentNotificationCommand {
    /// Raw body exactly as received.
    pub payload: Vec<u8>,
    /// Hex signature header, if one was sent.
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// Payment recorded and gate rebuilt.
    SubscriptionActivated {
        canonical_key: CanonicalKey,
        expires_at: Timestamp,
        gate_version: u64,
    },
    /// Settled deposit without subscriber metadata. Acknowledged so the
    /// processor stops redelivering; needs manual reconciliation.
    AcknowledgedWithoutIdentity { notification_id: String },
    /// Event kind the lifecycle does not act on.
    Ignored { event: String },
}

pub struct HandlePaymentNotificationHandler {
    store: Arc<dyn SubscriptionStore>,
    gate: Arc<AuthorizationGate>,
    verifier: PaymentNotificationVerifier,
    store_timeout: Duration,
}

impl HandlePaymentNotificationHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        gate: Arc<AuthorizationGate>,
        verifier: PaymentNotificationVerifier,
    ) -> Self {
        Self {
            store,
            gate,
            verifier,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentNotificationCommand,
    ) -> Result<NotificationOutcome, SubscriptionError> {
        // 1. Authenticate the raw bytes
        let signature = cmd.signature.as_deref().unwrap_or_default();
        if signature.trim().is_empty() {
            tracing::warn!("Payment notification without signature");
            return Err(SubscriptionError::Unauthenticated);
        }
        if !self.verifier.verify(&cmd.payload, signature) {
            tracing::warn!(payload_len = cmd.payload.len(), "Payment notification signature mismatch");
            return Err(SubscriptionError::Unauthenticated);
        }

        // 2. Parse
        let notification = PaymentNotification::parse(&cmd.payload).map_err(|e| {
            tracing::warn!(error = %e, "Authenticated payment notification is malformed");
            e
        })?;

        if let NotificationKind::Other(event) = notification.kind() {
            tracing::debug!(event = %event, notification_id = %notification.data.id, "Ignoring payment notification");
            return Ok(NotificationOutcome::Ignored { event });
        }

        tracing::info!(notification_id = %notification.data.id, "Received settled deposit notification");

        // 3. Identity from metadata
        let Some(raw_identity) = notification.subscriber_identity() else {
            tracing::warn!(
                notification_id = %notification.data.id,
                "Settled deposit has no subscriber identity in metadata"
            );
            return Ok(NotificationOutcome::AcknowledgedWithoutIdentity {
                notification_id: notification.data.id.clone(),
            });
        };
        let identity = EncodedIdentity::new(raw_identity)?;
        let canonical_key = identity.canonical_key().map_err(|e| {
            tracing::warn!(
                notification_id = %notification.data.id,
                identity = %identity,
                error = %e,
                "Settled deposit carries an undecodable identity"
            );
            SubscriptionError::from(e)
        })?;

        // 4. Record payment, then rebuild the gate
        tracing::debug!(canonical_key = %canonical_key, "Recording payment");
        let subscription = bounded(
            self.store_timeout,
            self.store.mark_paid(&identity, Timestamp::now()),
        )
        .await?;
        let gate_version = bounded(self.store_timeout, self.gate.reload())
            .await
            .map_err(|e| {
                tracing::error!(
                    canonical_key = %canonical_key,
                    error = %e,
                    "Payment recorded but gate reload failed, awaiting redelivery"
                );
                e
            })?;

        let expires_at = subscription
            .expires_at
            .ok_or_else(|| SubscriptionError::persistence("Paid subscription has no expiry"))?;

        tracing::info!(
            canonical_key = %subscription.canonical_key,
            expires_at = %expires_at,
            gate_version,
            "Subscription activated"
        );

        Ok(NotificationOutcome::SubscriptionActivated {
            canonical_key: subscription.canonical_key,
            expires_at,
            gate_version,
        })
    }
}
