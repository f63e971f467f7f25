//! Write policies for the relay and blob server.

use std::sync::Arc;

use crate::application::AuthorizationGate;

/// Message returned to blob clients without an active subscription.
pub const BLOB_REJECT_MESSAGE: &str = "you must have an active subscription to upload to this server";

/// HTTP status returned with [`BLOB_REJECT_MESSAGE`].
pub const BLOB_REJECT_STATUS: u16 = 403;

/// Relay hook: decides whether an event may be stored.
#[derive(Clone)]
pub struct EventWritePolicy {
    gate: Arc<AuthorizationGate>,
}

impl EventWritePolicy {
    pub fn new(gate: Arc<AuthorizationGate>) -> Self {
        Self { gate }
    }

    /// Returns the rejection reason for an event authored by `pubkey`, or
    /// `None` when the write is allowed.
    pub fn reject_event(&self, pubkey: &str) -> Option<String> {
        match self.gate.authorize(pubkey) {
            Ok(()) => None,
            Err(rejection) => {
                tracing::debug!(pubkey = %pubkey, reason = %rejection, "Event write rejected");
                Some(rejection.to_string())
            }
        }
    }
}

/// Result of the blob upload hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadVerdict {
    Accept { ext: String, size: u64 },
    Reject { message: String, status: u16 },
}

/// Blob server hook: decides whether an upload may be stored.
#[derive(Clone)]
pub struct BlobUploadPolicy {
    gate: Arc<AuthorizationGate>,
}

impl BlobUploadPolicy {
    pub fn new(gate: Arc<AuthorizationGate>) -> Self {
        Self { gate }
    }

    /// Size and extension are passed through untouched.
    pub fn reject_upload(&self, pubkey: &str, size: u64, ext: &str) -> UploadVerdict {
        match self.gate.authorize(pubkey) {
            Ok(()) => UploadVerdict::Accept {
                ext: ext.to_string(),
                size,
            },
            Err(rejection) => {
                tracing::debug!(pubkey = %pubkey, size, reason = %rejection, "Blob upload rejected");
                UploadVerdict::Reject {
                    message: BLOB_REJECT_MESSAGE.to_string(),
                    status: BLOB_REJECT_STATUS,
                }
            }
        }
    }
}
