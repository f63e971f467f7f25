//! Expiry sweeper - periodically demotes lapsed subscriptions.
//!
//! Runs as a background task alongside the HTTP server. Each tick calls
//! `sweep_expired(now)` on the store and, when records were demoted and
//! `reload_gate` is set, rebuilds the authorization gate so revoked keys stop
//! writing immediately.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 1h | Time between sweeps |
//! | `reload_gate` | true | Rebuild the gate after a sweep that demoted records |
//!
//! ## Failure handling
//!
//! Store errors are logged and the sweep is retried on the next tick. A
//! failed gate reload stays owed until a later tick's reload succeeds, since
//! the rows it should revoke are no longer picked up by the sweep. A tick
//! always completes before the next one starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::SubscriptionError;
use crate::ports::SubscriptionStore;

use super::AuthorizationGate;

#[derive(Debug, Clone)]
pub struct SweeperSettings {
    pub interval: Duration,
    pub reload_gate: bool,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            reload_gate: true,
        }
    }
}

impl SweeperSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_reload_gate(mut self, reload_gate: bool) -> Self {
        self.reload_gate = reload_gate;
        self
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Records flipped from active to expired.
    pub demoted: u64,
    /// Version of the gate snapshot built during this tick, if any.
    pub gate_version: Option<u64>,
}

pub struct ExpirySweeper {
    store: Arc<dyn SubscriptionStore>,
    gate: Arc<AuthorizationGate>,
    settings: SweeperSettings,
    /// Set once a sweep demoted records, cleared when a reload succeeds.
    reload_pending: AtomicBool,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        gate: Arc<AuthorizationGate>,
        settings: SweeperSettings,
    ) -> Self {
        Self {
            store,
            gate,
            settings,
            reload_pending: AtomicBool::new(false),
        }
    }

    /// Runs the sweep loop until the shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            reload_gate = self.settings.reload_gate,
            "Expiry sweeper started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Expiry sweeper stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.tick(Timestamp::now()).await {
                        tracing::error!(error = %e, "Expiry sweep failed, retrying next tick");
                    }
                }
            }
        }
    }

    /// Performs a single sweep at `now`.
    ///
    /// A gate reload owed by an earlier tick is attempted even when this
    /// sweep demotes nothing.
    pub async fn tick(&self, now: Timestamp) -> Result<SweepReport, SubscriptionError> {
        let demoted = self.store.sweep_expired(now).await?;

        if demoted > 0 {
            tracing::info!(demoted, "Expired subscriptions demoted");
            if self.settings.reload_gate {
                self.reload_pending.store(true, Ordering::SeqCst);
            }
        } else {
            tracing::debug!("Expiry sweep found nothing to demote");
        }

        let gate_version = if self.reload_pending.load(Ordering::SeqCst) {
            let version = self.gate.reload().await.map_err(|e| {
                tracing::warn!(error = %e, "Gate reload after sweep failed, retrying next tick");
                e
            })?;
            self.reload_pending.store(false, Ordering::SeqCst);
            Some(version)
        } else {
            None
        };

        Ok(SweepReport {
            demoted,
            gate_version,
        })
    }
}
