//! Relay presentation configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Metadata shown on the relay landing page and info document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Operator public key, 64 hex characters
    #[serde(default)]
    pub pubkey: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub contact: String,

    #[serde(default)]
    pub url: String,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let pubkey = self.pubkey.trim();
        if !pubkey.is_empty() && (pubkey.len() != 64 || !pubkey.bytes().all(|b| b.is_ascii_hexdigit())) {
            return Err(ValidationError::InvalidRelayPubkey);
        }
        Ok(())
    }
}
