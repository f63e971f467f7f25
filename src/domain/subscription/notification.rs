//! Payment notification payload.
//!
//! Only parsed after the signature over the raw bytes has been verified.
//! Fields the lifecycle does not use are ignored.

use serde::Deserialize;

use super::SubscriptionError;

/// Event kind sent when a Lightning deposit settles.
pub const DEPOSIT_COMPLETED_EVENT: &str = "deposit.lightning.completed";

/// Classified notification event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    DepositCompleted,
    Other(String),
}

/// Notification body posted by the payment processor.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub event: String,
    pub data: NotificationData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationData {
    /// Processor-side deposit id.
    pub id: String,

    #[serde(default)]
    pub status: Option<String>,

    /// Reconciliation metadata attached when the invoice was created.
    #[serde(default)]
    pub metadata: Option<NotificationMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationMetadata {
    #[serde(default, alias = "identity")]
    pub npub: Option<String>,
}

impl PaymentNotification {
    /// Parses an already-authenticated body.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if the body is not JSON or lacks `event` / `data.id`.
    pub fn parse(payload: &[u8]) -> Result<Self, SubscriptionError> {
        serde_json::from_slice(payload).map_err(|e| SubscriptionError::malformed(e.to_string()))
    }

    pub fn kind(&self) -> NotificationKind {
        match self.event.as_str() {
            DEPOSIT_COMPLETED_EVENT => NotificationKind::DepositCompleted,
            other => NotificationKind::Other(other.to_string()),
        }
    }

    /// The subscriber identity carried in metadata, if any non-blank one is present.
    pub fn subscriber_identity(&self) -> Option<&str> {
        self.data
            .metadata
            .as_ref()
            .and_then(|m| m.npub.as_deref())
            .map(str::trim)
            .filter(|npub| !npub.is_empty())
    }
}
