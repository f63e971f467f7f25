//! Expiry sweeper configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweeps
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Rebuild the authorization gate after a sweep that demoted records
    #[serde(default = "default_reload_gate")]
    pub reload_gate: bool,
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            reload_gate: default_reload_gate(),
        }
    }
}

fn default_interval() -> u64 {
    3600
}

fn default_reload_gate() -> bool {
    true
}
