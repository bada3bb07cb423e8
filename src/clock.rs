// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Saturating instant arithmetic.
//!
//! The core never panics on date overflow: window starts saturate to the
//! earliest representable instant, deadlines to the latest.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Instant at which an attempt happened.
pub type Timestamp = DateTime<Utc>;

/// `now - window`, saturating.
pub fn window_start(now: Timestamp, window: Duration) -> Timestamp {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `now + duration`, saturating.
pub fn deadline(now: Timestamp, duration: Duration) -> Timestamp {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time from `now` until `until`, zero if already past.
pub fn remaining(now: Timestamp, until: Timestamp) -> Duration {
    until
        .signed_duration_since(now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
