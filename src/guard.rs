// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Single entry point for signup attempts.
//!
//! Validation first, then the rate limiter. An admitted attempt is recorded
//! under the same lock that decided it, and the normalized email is handed
//! back for the caller to persist.

use crate::clock::Timestamp;
use crate::error::SignupError;
use crate::limiter::{Decision, RateLimiter};
use crate::metrics::GuardMetrics;
use crate::validator::{EmailValidator, NormalizedEmail};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome label used for accepted attempts in metrics.
pub const ACCEPTED: &str = "accepted";

/// Validator and rate limiter behind one operation.
pub struct SignupGuard {
    validator: EmailValidator,
    limiter: Arc<RateLimiter>,
    metrics: Option<GuardMetrics>,
}

impl SignupGuard {
    pub fn new(validator: EmailValidator, limiter: Arc<RateLimiter>) -> Self {
        Self {
            validator,
            limiter,
            metrics: None,
        }
    }

    /// Count every outcome in `metrics`.
    pub fn with_metrics(mut self, metrics: GuardMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Shared handle to the limiter, for the janitor.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Decide one signup attempt.
    ///
    /// `raw_email` is `None` when the field was absent or not a string.
    pub async fn submit(
        &self,
        identifier: &str,
        raw_email: Option<&str>,
        now: Timestamp,
    ) -> Result<NormalizedEmail, SignupError> {
        info!(%identifier, at = %now.to_rfc3339(), "Waitlist attempt");

        let result = self.decide(identifier, raw_email, now).await;

        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(_) => metrics.observe_decision(ACCEPTED),
                Err(err) => metrics.observe_decision(err.code()),
            }
        }

        result
    }

    async fn decide(
        &self,
        identifier: &str,
        raw_email: Option<&str>,
        now: Timestamp,
    ) -> Result<NormalizedEmail, SignupError> {
        let email = self
            .validator
            .normalize_and_validate(raw_email)
            .inspect_err(|err| debug!(%identifier, code = err.code(), "Validation failed"))?;

        match self.limiter.admit(identifier, email.as_str(), now).await {
            Decision::Admit => {
                debug!(%identifier, "Signup admitted");
                Ok(email)
            }
            Decision::Deny {
                reason,
                retry_after,
            } => {
                info!(
                    %identifier,
                    reason = reason.code(),
                    retry_after_secs = retry_after.as_secs(),
                    "Signup rate limited"
                );
                Err(SignupError::RateLimited {
                    reason,
                    retry_after,
                })
            }
        }
    }
}
