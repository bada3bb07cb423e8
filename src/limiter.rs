// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter for waitlist signups.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. Active block on the identifier
//! 2. Burst (3 per 60s default), escalating to a one hour block
//! 3. Hourly volume per identifier (5 per hour default), no escalation
//! 4. Email reuse within 24 hours
//!
//! Only admitted attempts are recorded. An identifier that keeps getting
//! `duplicate_email` denials therefore never consumes its own burst or
//! hourly quota with them.

use crate::blocklist::BlockList;
use crate::clock::{deadline, remaining, window_start, Timestamp};
use crate::config::LimitsConfig;
use crate::ledger::{AttemptLedger, EvictionStats};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Outcome of evaluating one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Attempt may proceed
    Admit,
    /// Attempt is denied
    Deny {
        /// Reason for denial
        reason: DenyReason,
        /// Time until the same attempt could succeed
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Admit => None,
            Decision::Deny { reason, .. } => Some(*reason),
        }
    }
}

/// Reason for denying an attempt.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// Identifier is serving a block after a burst
    #[error("IP temporarily blocked due to abuse")]
    Blocked,
    /// Identifier just exceeded the burst threshold and is now blocked
    #[error("Too many requests. Please try again later.")]
    Burst,
    /// Identifier exceeded its hourly signup allowance
    #[error("Too many signups from this location. Please try again later.")]
    HourlyLimit,
    /// Email was already admitted within the reuse window
    #[error("This email was recently used. Please try again tomorrow.")]
    DuplicateEmail,
}

impl DenyReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Burst => "burst",
            Self::HourlyLimit => "hourly_limit",
            Self::DuplicateEmail => "duplicate_email",
        }
    }

    pub const ALL: [DenyReason; 4] = [
        Self::Blocked,
        Self::Burst,
        Self::HourlyLimit,
        Self::DuplicateEmail,
    ];
}

/// Counts from one sweep of the limiter state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub ledger: EvictionStats,
    pub blocks_purged: usize,
}

/// Point-in-time size of the limiter state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimiterStats {
    pub tracked_identifiers: usize,
    pub tracked_emails: usize,
    pub active_blocks: usize,
}

/// Ledger and block list, always mutated together under one lock.
#[derive(Debug)]
pub(crate) struct LimiterState {
    pub(crate) ledger: AttemptLedger,
    pub(crate) blocks: BlockList,
}

impl LimiterState {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            ledger: AttemptLedger::new(limits.attempt_retention(), limits.email_window()),
            blocks: BlockList::new(),
        }
    }

    /// Render a decision for one attempt. Only a burst mutates state (the
    /// block escalation); recording is the caller's job.
    pub fn evaluate(
        &mut self,
        limits: &LimitsConfig,
        identifier: &str,
        email: &str,
        now: Timestamp,
    ) -> Decision {
        if let Some(until) = self.blocks.blocked_until(identifier, now) {
            debug!(%identifier, %until, "Identifier blocked");
            return Decision::Deny {
                reason: DenyReason::Blocked,
                retry_after: remaining(now, until),
            };
        }

        let burst = self
            .ledger
            .count_within(identifier, now, limits.burst_window());
        if burst >= limits.burst_limit as usize {
            let block_duration = limits.block_duration();
            let until = self.blocks.block(identifier, now, block_duration);
            warn!(%identifier, burst, %until, "Burst detected, blocking identifier");
            return Decision::Deny {
                reason: DenyReason::Burst,
                retry_after: block_duration,
            };
        }

        let hourly_window = limits.hourly_window();
        let hourly = self.ledger.count_within(identifier, now, hourly_window);
        if hourly >= limits.per_ip_hourly_limit as usize {
            let retry_after = self
                .ledger
                .oldest_within(identifier, now, hourly_window)
                .map(|oldest| remaining(now, deadline(oldest, hourly_window)))
                .unwrap_or(hourly_window);
            debug!(%identifier, hourly, ?retry_after, "Hourly limit reached");
            return Decision::Deny {
                reason: DenyReason::HourlyLimit,
                retry_after,
            };
        }

        let email_window = limits.email_window();
        if let Some(last) = self.ledger.last_attempt(email) {
            if last > window_start(now, email_window) {
                let retry_after = remaining(now, deadline(last, email_window));
                debug!(%identifier, ?retry_after, "Email recently used");
                return Decision::Deny {
                    reason: DenyReason::DuplicateEmail,
                    retry_after,
                };
            }
        }

        Decision::Admit
    }

    /// Evict stale ledger entries and expired blocks.
    pub fn sweep(&mut self, now: Timestamp) -> SweepStats {
        SweepStats {
            ledger: self.ledger.evict(now),
            blocks_purged: self.blocks.purge_expired(now),
        }
    }

    pub fn stats(&self, now: Timestamp) -> LimiterStats {
        LimiterStats {
            tracked_identifiers: self.ledger.tracked_identifiers(),
            tracked_emails: self.ledger.tracked_emails(),
            active_blocks: self.blocks.active(now),
        }
    }
}

/// Thread-safe rate limiter. One instance per process, shared by handle.
pub struct RateLimiter {
    /// Configuration
    limits: LimitsConfig,
    /// Ledger and block list
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// Create a new rate limiter with empty state.
    pub fn new(limits: LimitsConfig) -> Self {
        let state = LimiterState::new(&limits);
        Self {
            limits,
            state: Mutex::new(state),
        }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Evaluate an attempt without recording it. A burst still escalates
    /// to a block. Use [`RateLimiter::admit`] to decide and record.
    pub async fn evaluate(&self, identifier: &str, email: &str, now: Timestamp) -> Decision {
        let mut state = self.state.lock().await;
        state.evaluate(&self.limits, identifier, email, now)
    }

    /// Record an attempt that was admitted.
    #[cfg(test)]
    pub(crate) async fn record(&self, identifier: &str, email: &str, now: Timestamp) {
        let mut state = self.state.lock().await;
        state.ledger.record(identifier, email, now);
    }

    /// Evaluate and, on admission, record under a single lock acquisition.
    ///
    /// Two concurrent attempts for the same identifier are both counted and
    /// two concurrent submissions of the same email cannot both be admitted.
    pub async fn admit(&self, identifier: &str, email: &str, now: Timestamp) -> Decision {
        let mut state = self.state.lock().await;
        let decision = state.evaluate(&self.limits, identifier, email, now);
        if decision.is_admitted() {
            state.ledger.record(identifier, email, now);
        }
        decision
    }

    /// Reclaim memory held by stale entries.
    pub async fn sweep(&self, now: Timestamp) -> SweepStats {
        let mut state = self.state.lock().await;
        state.sweep(now)
    }

    /// Current state sizes.
    pub async fn stats(&self, now: Timestamp) -> LimiterStats {
        let state = self.state.lock().await;
        state.stats(now)
    }
}
