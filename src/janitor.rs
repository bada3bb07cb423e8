// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Periodic sweep of the limiter state.
//!
//! Purely memory reclamation: decisions only look back a fixed window, so
//! a janitor that never runs costs memory, not correctness.

use crate::limiter::{RateLimiter, SweepStats};
use crate::metrics::GuardMetrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawns and owns the sweep task.
pub struct Janitor {
    limiter: Arc<RateLimiter>,
    interval: Duration,
    metrics: Option<GuardMetrics>,
}

/// Handle to a running janitor task.
pub struct JanitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Janitor {
    pub fn new(limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self {
            limiter,
            interval,
            metrics: None,
        }
    }

    /// Report sweep results to `metrics`.
    pub fn with_metrics(mut self, metrics: GuardMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run one sweep against the wall clock.
    pub async fn sweep_once(&self) -> SweepStats {
        let now = Utc::now();
        let stats = self.limiter.sweep(now).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_sweep(&stats);
            metrics.observe_state(&self.limiter.stats(now).await);
        }
        debug!(
            timestamps_dropped = stats.ledger.timestamps_dropped,
            identifiers_removed = stats.ledger.identifiers_removed,
            emails_removed = stats.ledger.emails_removed,
            blocks_purged = stats.blocks_purged,
            "Limiter sweep complete"
        );
        stats
    }

    /// Start sweeping every `interval` until the handle is shut down.
    pub fn spawn(self) -> JanitorHandle {
        let (stop, mut stopped) = watch::channel(false);
        let interval = self.interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "Janitor started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep_once().await;
                    }
                    changed = stopped.changed() => {
                        // A dropped sender also means stop.
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Janitor stopped");
        });

        JanitorHandle { stop, task }
    }
}

impl JanitorHandle {
    /// Signal the task to stop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
