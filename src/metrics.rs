// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for signup decisions and limiter state.

use crate::limiter::{LimiterStats, SweepStats};
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Counters and gauges, registered on a private registry.
#[derive(Clone)]
pub struct GuardMetrics {
    registry: Registry,
    /// Signup outcomes, labelled by `outcome` (`accepted` or an error code)
    decisions: IntCounterVec,
    sweeps: IntCounter,
    evicted_identifiers: IntCounter,
    tracked_identifiers: IntGauge,
    tracked_emails: IntGauge,
    active_blocks: IntGauge,
}

impl GuardMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("waitlist_guard".to_string()), None)?;

        let decisions = IntCounterVec::new(
            Opts::new("decisions_total", "Signup attempts by outcome"),
            &["outcome"],
        )?;
        let sweeps = IntCounter::new("sweeps_total", "Completed janitor sweeps")?;
        let evicted_identifiers = IntCounter::new(
            "evicted_identifiers_total",
            "Identifiers removed from the ledger by sweeps",
        )?;
        let tracked_identifiers =
            IntGauge::new("tracked_identifiers", "Identifiers with recorded attempts")?;
        let tracked_emails = IntGauge::new("tracked_emails", "Emails in the reuse window")?;
        let active_blocks = IntGauge::new("active_blocks", "Identifiers currently blocked")?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(sweeps.clone()))?;
        registry.register(Box::new(evicted_identifiers.clone()))?;
        registry.register(Box::new(tracked_identifiers.clone()))?;
        registry.register(Box::new(tracked_emails.clone()))?;
        registry.register(Box::new(active_blocks.clone()))?;

        Ok(Self {
            registry,
            decisions,
            sweeps,
            evicted_identifiers,
            tracked_identifiers,
            tracked_emails,
            active_blocks,
        })
    }

    /// Count one signup outcome.
    pub fn observe_decision(&self, outcome: &str) {
        self.decisions.with_label_values(&[outcome]).inc();
    }

    /// Current count for `outcome`. Reading never creates the series.
    pub fn decision_count(&self, outcome: &str) -> u64 {
        self.decisions
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == "outcome" && label.get_value() == outcome)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    pub fn observe_sweep(&self, stats: &SweepStats) {
        self.sweeps.inc();
        self.evicted_identifiers
            .inc_by(stats.ledger.identifiers_removed as u64);
    }

    pub fn observe_state(&self, stats: &LimiterStats) {
        self.tracked_identifiers.set(stats.tracked_identifiers as i64);
        self.tracked_emails.set(stats.tracked_emails as i64);
        self.active_blocks.set(stats.active_blocks as i64);
    }

    /// Render the registry in the Prometheus text format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        if let Err(err) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!(error = %err, "Failed to encode metrics");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
