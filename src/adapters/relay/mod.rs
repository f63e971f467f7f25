//! Relay and blob server write hooks.
//!
//! The event store and blob store call these on every write. Both defer to
//! the shared `AuthorizationGate`.

mod write_policy;

pub use write_policy::{
    BlobUploadPolicy, EventWritePolicy, UploadVerdict, BLOB_REJECT_MESSAGE, BLOB_REJECT_STATUS,
};
