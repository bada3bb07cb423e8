// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Signup email validator.
//!
//! Normalizes the submitted address (trim + lower-case) and checks it
//! against a conventional `local@domain.tld` shape before it ever reaches
//! the rate limiter:
//! - Presence of the field
//! - Character set and shape of local part and domain
//! - Overall length
//! - Alias stacking (`a+1+2@...`) used to dodge duplicate detection

use crate::config::ValidationConfig;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email is required")]
    MissingInput,

    #[error("Please enter a valid email address")]
    MalformedEmail,

    #[error("Invalid email format")]
    SuspiciousPattern,
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::MalformedEmail => "malformed_email",
            Self::SuspiciousPattern => "suspicious_pattern",
        }
    }
}

/// An email address that has been trimmed, lower-cased and validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim surrounding whitespace (including a stray byte order mark) and
/// lower-case. Idempotent.
pub fn normalize(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_lowercase()
}

/// Signup email validator.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    config: ValidationConfig,
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl EmailValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Normalize and validate a submitted email.
    ///
    /// `None` means the field was absent or not a string.
    pub fn normalize_and_validate(
        &self,
        raw: Option<&str>,
    ) -> Result<NormalizedEmail, ValidationError> {
        let raw = match raw {
            Some(r) if !r.is_empty() => r,
            _ => {
                debug!("Missing email field");
                return Err(ValidationError::MissingInput);
            }
        };

        let email = normalize(raw);

        if email.chars().count() > self.config.max_email_len || !has_email_shape(&email) {
            debug!(len = email.len(), "Malformed email");
            return Err(ValidationError::MalformedEmail);
        }

        let plus_tags = email.matches('+').count();
        if plus_tags > self.config.max_plus_tags {
            debug!(plus_tags, "Stacked alias tags in email");
            return Err(ValidationError::SuspiciousPattern);
        }

        Ok(NormalizedEmail(email))
    }
}

/// `[a-z0-9._%+-]+ @ [a-z0-9.-]+ . [a-z]{2,}` on an already lower-cased string.
fn has_email_shape(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }

    // The TLD is letters only, so the last dot is the only candidate split.
    let Some((labels, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !labels.is_empty()
        && labels.chars().all(is_domain_char)
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_lowercase())
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_domain_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-')
}
