// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for abuse simulation results.

use std::collections::HashMap;
use std::time::Duration;
use waitlist_guard::{DenyReason, NormalizedEmail, SignupError, ValidationError};

/// Collects metrics during an abuse simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by identifier
    requests_per_ip: HashMap<String, usize>,
    /// Normalized emails that were admitted
    admitted_emails: Vec<String>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a signup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    Blocked,
    Burst,
    HourlyLimit,
    DuplicateEmail,
    MissingInput,
    MalformedEmail,
    SuspiciousPattern,
}

impl Outcome {
    pub fn from_result(result: &Result<NormalizedEmail, SignupError>) -> Self {
        match result {
            Ok(_) => Outcome::Accepted,
            Err(SignupError::Validation(ValidationError::MissingInput)) => Outcome::MissingInput,
            Err(SignupError::Validation(ValidationError::MalformedEmail)) => {
                Outcome::MalformedEmail
            }
            Err(SignupError::Validation(ValidationError::SuspiciousPattern)) => {
                Outcome::SuspiciousPattern
            }
            Err(SignupError::RateLimited { reason, .. }) => match reason {
                DenyReason::Blocked => Outcome::Blocked,
                DenyReason::Burst => Outcome::Burst,
                DenyReason::HourlyLimit => Outcome::HourlyLimit,
                DenyReason::DuplicateEmail => Outcome::DuplicateEmail,
            },
        }
    }

    fn is_validation(&self) -> bool {
        matches!(
            self,
            Outcome::MissingInput | Outcome::MalformedEmail | Outcome::SuspiciousPattern
        )
    }
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt outcome.
    pub fn record(
        &mut self,
        result: &Result<NormalizedEmail, SignupError>,
        ip: &str,
        latency: Duration,
    ) {
        let outcome = Outcome::from_result(result);
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_ip.entry(ip.to_string()).or_insert(0) += 1;
        if let Ok(email) = result {
            self.admitted_emails.push(email.to_string());
        }
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Get total request count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Admitted emails, in admission order.
    pub fn admitted_emails(&self) -> &[String] {
        &self.admitted_emails
    }

    /// Get block rate (ratio of rejected to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        let allowed = self.count(Outcome::Accepted);
        (total - allowed) as f64 / total as f64
    }

    /// Get p99 latency in microseconds.
    pub fn p99_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let idx = (sorted.len() as f64 * 0.99) as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Get number of unique identifiers that made requests.
    pub fn unique_ips(&self) -> usize {
        self.requests_per_ip.len()
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            accepted: self.count(Outcome::Accepted),
            blocked: self.count(Outcome::Blocked),
            burst: self.count(Outcome::Burst),
            hourly_limit: self.count(Outcome::HourlyLimit),
            duplicate_email: self.count(Outcome::DuplicateEmail),
            validation_failed: self
                .outcomes
                .iter()
                .filter(|(o, _)| o.is_validation())
                .map(|(_, n)| n)
                .sum(),
            block_rate: self.block_rate(),
            p99_latency_us: self.p99_latency_us(),
            unique_ips: self.unique_ips(),
        }
    }
}

/// Summary report of simulation metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub accepted: usize,
    pub blocked: usize,
    pub burst: usize,
    pub hourly_limit: usize,
    pub duplicate_email: usize,
    pub validation_failed: usize,
    pub block_rate: f64,
    pub p99_latency_us: u64,
    pub unique_ips: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Abuse Simulation Report ===")?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f, "Accepted:          {}", self.accepted)?;
        writeln!(f, "Blocked:           {}", self.blocked)?;
        writeln!(f, "Burst:             {}", self.burst)?;
        writeln!(f, "Hourly Limit:      {}", self.hourly_limit)?;
        writeln!(f, "Duplicate Email:   {}", self.duplicate_email)?;
        writeln!(f, "Validation Failed: {}", self.validation_failed)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "P99 Latency:       {} us", self.p99_latency_us)?;
        writeln!(f, "Unique IPs:        {}", self.unique_ips)?;
        Ok(())
    }
}
