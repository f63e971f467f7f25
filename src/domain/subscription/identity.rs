//! Subscriber identity value objects.
//!
//! A subscriber is known to clients and to the payment processor by an
//! `npub` (bech32 encoded public key). Storage and the authorization gate work
//! on the canonical key: the same 32 bytes as 64 lowercase hex characters,
//! which is what relay events carry in their `pubkey` field.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Human readable prefix of a public key identity.
pub const NPUB_PREFIX: &str = "npub";

/// Length of a public key in bytes.
const KEY_LEN: usize = 32;

/// Errors that occur while decoding a subscriber identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity is empty")]
    Empty,

    #[error("invalid bech32 encoding: {0}")]
    InvalidEncoding(String),

    #[error("expected 'npub' prefix, found '{0}'")]
    WrongPrefix(String),

    #[error("expected 32 byte key, found {0} bytes")]
    WrongLength(usize),

    #[error("canonical key must be 64 hex characters")]
    InvalidHex,
}

/// User-facing encoded identity (`npub1...`).
///
/// Construction only checks that the value is non-empty; decoding into a
/// [`CanonicalKey`] happens at the point of use so that callers get a typed
/// error for that operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedIdentity(String);

impl EncodedIdentity {
    /// Wraps a raw identity string, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the bech32 string into its canonical key.
    ///
    /// Only the original bech32 checksum is accepted; bech32m strings are
    /// rejected.
    pub fn canonical_key(&self) -> Result<CanonicalKey, IdentityError> {
        let checked = CheckedHrpstring::new::<Bech32>(&self.0)
            .map_err(|e| IdentityError::InvalidEncoding(e.to_string()))?;

        let prefix = checked.hrp().to_lowercase();
        if prefix != NPUB_PREFIX {
            return Err(IdentityError::WrongPrefix(prefix));
        }
        let data: Vec<u8> = checked.byte_iter().collect();
        if data.len() != KEY_LEN {
            return Err(IdentityError::WrongLength(data.len()));
        }

        Ok(CanonicalKey(hex::encode(data)))
    }
}

impl fmt::Display for EncodedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage-level subscriber key: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Parses a hex public key as found on relay events.
    ///
    /// Upper-case input is normalised to lower case.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        if value.is_empty() {
            return Err(IdentityError::Empty);
        }
        if value.len() != KEY_LEN * 2 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IdentityError::InvalidHex);
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes this key back into its `npub` form.
    pub fn to_encoded_identity(&self) -> Result<EncodedIdentity, IdentityError> {
        let bytes = hex::decode(&self.0).map_err(|_| IdentityError::InvalidHex)?;
        let hrp = Hrp::parse(NPUB_PREFIX)
            .map_err(|e| IdentityError::InvalidEncoding(e.to_string()))?;
        let encoded = bech32::encode::<Bech32>(hrp, &bytes)
            .map_err(|e| IdentityError::InvalidEncoding(e.to_string()))?;
        Ok(EncodedIdentity(encoded))
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
