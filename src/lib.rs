// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Waitlist Signup Guard
//!
//! This crate provides abuse prevention for a public waitlist signup
//! endpoint. Each attempt carries a client identifier and an email and
//! receives an allow/deny decision:
//!
//! - Email normalization and shape validation
//! - Burst detection (3 per minute) escalating to a one hour block
//! - Per-identifier hourly cap (5 per hour)
//! - One signup per email per 24 hours
//! - Periodic eviction of stale ledger entries
//!
//! State is process-local and memory-resident; a restart clears it.

pub mod blocklist;
pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod janitor;
pub mod ledger;
pub mod limiter;
pub mod metrics;
pub mod validator;

pub use config::Config;
pub use error::SignupError;
pub use guard::SignupGuard;
pub use janitor::{Janitor, JanitorHandle};
pub use limiter::{Decision, DenyReason, RateLimiter};
pub use validator::{EmailValidator, NormalizedEmail, ValidationError};
