// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window attempt ledger.
//!
//! Two independent namespaces:
//! 1. Per-identifier timestamp sequences (kept for the hourly window)
//! 2. Per-email last-attempt instant (kept for the email reuse window)
//!
//! Reads never evict; stale entries are reclaimed by [`AttemptLedger::evict`],
//! which the janitor calls on a fixed cadence.

use crate::clock::{window_start, Timestamp};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// Counts returned by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionStats {
    /// Individual attempt timestamps dropped
    pub timestamps_dropped: usize,
    /// Identifiers whose record became empty and was removed
    pub identifiers_removed: usize,
    /// Email entries that aged out
    pub emails_removed: usize,
}

/// Recorded attempts, grouped by identifier and by email.
#[derive(Debug)]
pub struct AttemptLedger {
    /// Ascending timestamps per identifier
    attempts: HashMap<String, VecDeque<Timestamp>>,
    /// Most recent admitted attempt per normalized email
    emails: HashMap<String, Timestamp>,
    attempt_retention: Duration,
    email_retention: Duration,
}

impl AttemptLedger {
    /// Create an empty ledger that keeps identifier attempts for
    /// `attempt_retention` and email entries for `email_retention`.
    pub fn new(attempt_retention: Duration, email_retention: Duration) -> Self {
        Self {
            attempts: HashMap::new(),
            emails: HashMap::new(),
            attempt_retention,
            email_retention,
        }
    }

    /// Append an attempt for `identifier` and stamp `email` with `now`.
    ///
    /// A clock that stepped backwards still yields a sorted sequence: the
    /// timestamp is inserted at its ordered position.
    pub fn record(&mut self, identifier: &str, email: &str, now: Timestamp) {
        let seq = self.attempts.entry(identifier.to_string()).or_default();
        match seq.back() {
            Some(last) if *last > now => {
                let at = seq.partition_point(|t| *t <= now);
                seq.insert(at, now);
            }
            _ => seq.push_back(now),
        }

        let last = self.emails.entry(email.to_string()).or_insert(now);
        if *last < now {
            *last = now;
        }
    }

    /// Number of attempts for `identifier` strictly newer than `now - window`.
    pub fn count_within(&self, identifier: &str, now: Timestamp, window: Duration) -> usize {
        let Some(seq) = self.attempts.get(identifier) else {
            return 0;
        };
        let cutoff = window_start(now, window);
        seq.len() - seq.partition_point(|t| *t <= cutoff)
    }

    /// Oldest attempt for `identifier` strictly newer than `now - window`.
    pub fn oldest_within(
        &self,
        identifier: &str,
        now: Timestamp,
        window: Duration,
    ) -> Option<Timestamp> {
        let seq = self.attempts.get(identifier)?;
        let cutoff = window_start(now, window);
        seq.get(seq.partition_point(|t| *t <= cutoff)).copied()
    }

    /// Most recent recorded attempt for a normalized email.
    pub fn last_attempt(&self, email: &str) -> Option<Timestamp> {
        self.emails.get(email).copied()
    }

    /// Drop attempts older than the attempt retention, remove identifiers
    /// left with no attempts, and drop emails older than the email retention.
    pub fn evict(&mut self, now: Timestamp) -> EvictionStats {
        let mut stats = EvictionStats::default();

        let cutoff = window_start(now, self.attempt_retention);
        self.attempts.retain(|_, seq| {
            while seq.front().is_some_and(|t| *t <= cutoff) {
                seq.pop_front();
                stats.timestamps_dropped += 1;
            }
            if seq.is_empty() {
                stats.identifiers_removed += 1;
                false
            } else {
                true
            }
        });

        let email_cutoff = window_start(now, self.email_retention);
        let before = self.emails.len();
        self.emails.retain(|_, last| *last > email_cutoff);
        stats.emails_removed = before - self.emails.len();

        stats
    }

    /// Identifiers currently holding at least one attempt.
    pub fn tracked_identifiers(&self) -> usize {
        self.attempts.len()
    }

    /// Emails currently remembered.
    pub fn tracked_emails(&self) -> usize {
        self.emails.len()
    }

    /// Whether a record exists for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.attempts.contains_key(identifier)
    }
}
