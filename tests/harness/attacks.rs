// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

use std::time::Duration;

/// How the submitted email is chosen for each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailMix {
    /// Distinct, well-formed addresses drawn from a pool
    Pool,
    /// Stacked `+` aliases of one mailbox
    AliasStacked,
    /// Garbage that fails shape validation
    Malformed,
    /// Case and whitespace variants of a single address
    CaseVariants,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of signup attempts
    pub total_requests: usize,
    /// Simulated time between attempts
    pub spacing: Duration,
    /// Number of unique identifiers to rotate through
    pub unique_ips: usize,
    /// Size of the email pool (reused round-robin when smaller than the request count)
    pub unique_emails: usize,
    /// Kind of email submitted
    pub email_mix: EmailMix,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            spacing: Duration::from_secs(1),
            unique_ips: 1,
            unique_emails: 100,
            email_mix: EmailMix::Pool,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// Single IP flood - one source hammering the endpoint.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 200,
            spacing: Duration::from_millis(100),
            unique_emails: 200,
            ..Default::default()
        }
    }

    /// Distributed signups - many identifiers, a few attempts each.
    pub fn distributed_signups() -> Self {
        Self {
            total_requests: 500,
            spacing: Duration::from_millis(200),
            unique_ips: 250,
            unique_emails: 500,
            ..Default::default()
        }
    }

    /// Email replay - one address resubmitted from rotating identifiers.
    pub fn email_replay() -> Self {
        Self {
            total_requests: 100,
            spacing: Duration::from_secs(5),
            unique_ips: 20,
            unique_emails: 1,
            ..Default::default()
        }
    }

    /// Case/whitespace variants of one address, trying to dodge dedup.
    pub fn case_variant_replay() -> Self {
        Self {
            total_requests: 40,
            spacing: Duration::from_secs(30),
            unique_ips: 40,
            email_mix: EmailMix::CaseVariants,
            ..Default::default()
        }
    }

    /// Alias stacking - `user+a+b@` style addresses.
    pub fn alias_stacking() -> Self {
        Self {
            total_requests: 50,
            spacing: Duration::from_secs(10),
            unique_ips: 10,
            email_mix: EmailMix::AliasStacked,
            ..Default::default()
        }
    }

    /// Malformed spam - junk payloads.
    pub fn malformed_spam() -> Self {
        Self {
            total_requests: 50,
            spacing: Duration::from_secs(1),
            unique_ips: 5,
            email_mix: EmailMix::Malformed,
            ..Default::default()
        }
    }

    /// Slow drip - one identifier staying under every limit.
    pub fn slow_drip() -> Self {
        Self {
            total_requests: 15,
            spacing: Duration::from_secs(721), // fewer than 5 per trailing hour
            unique_emails: 15,
            ..Default::default()
        }
    }

    /// Simulated duration of the attack.
    pub fn expected_duration(&self) -> Duration {
        self.spacing * self.total_requests.saturating_sub(1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_duration() {
        let config = AttackConfig::slow_drip();
        assert_eq!(config.expected_duration(), Duration::from_secs(721 * 14));
    }
}
