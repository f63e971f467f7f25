//! Subscription domain module.
//!
//! # Module Structure
//!
//! - `identity` - npub / canonical key value objects
//! - `status` - SubscriptionStatus state machine
//! - `aggregate` - Subscription record and its transitions
//! - `notification` - Payment notification payload
//! - `notification_verifier` - HMAC-SHA256 signature check
//! - `errors` - SubscriptionError taxonomy

mod aggregate;
mod errors;
mod identity;
mod notification;
mod notification_verifier;
mod status;

pub use aggregate::{Subscription, SUBSCRIPTION_PERIOD_YEARS};
pub use errors::SubscriptionError;
pub use identity::{CanonicalKey, EncodedIdentity, IdentityError, NPUB_PREFIX};
pub use notification::{
    NotificationData, NotificationKind, NotificationMetadata, PaymentNotification,
    DEPOSIT_COMPLETED_EVENT,
};
pub use notification_verifier::{compute_signature, PaymentNotificationVerifier, SIGNATURE_HEADER};
pub use status::SubscriptionStatus;
