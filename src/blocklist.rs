// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Timed suspension set.
//!
//! Expiry is checked lazily on read; no per-entry timers. Expired entries
//! linger until [`BlockList::purge_expired`] runs during a sweep.

use crate::clock::{deadline, Timestamp};
use std::collections::HashMap;
use std::time::Duration;

/// Identifiers suspended until an expiry instant.
#[derive(Debug, Default)]
pub struct BlockList {
    entries: HashMap<String, Timestamp>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a non-expired entry exists for `identifier`.
    pub fn is_blocked(&self, identifier: &str, now: Timestamp) -> bool {
        self.blocked_until(identifier, now).is_some()
    }

    /// Expiry of the active block for `identifier`, if any.
    pub fn blocked_until(&self, identifier: &str, now: Timestamp) -> Option<Timestamp> {
        self.entries
            .get(identifier)
            .copied()
            .filter(|until| now < *until)
    }

    /// Block `identifier` until `now + duration`, replacing any earlier entry.
    pub fn block(&mut self, identifier: &str, now: Timestamp, duration: Duration) -> Timestamp {
        let until = deadline(now, duration);
        self.entries.insert(identifier.to_string(), until);
        until
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, until| now < *until);
        before - self.entries.len()
    }

    /// Entries still active at `now`.
    pub fn active(&self, now: Timestamp) -> usize {
        self.entries.values().filter(|until| now < **until).count()
    }
}
