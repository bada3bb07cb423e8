// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the waitlist signup guard.
//!
//! Defaults reproduce the reference abuse policy: 5 signups per identifier
//! per hour, one signup per email per day, 3 attempts per minute before a
//! one hour block, and a ledger sweep every 10 minutes.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Longest window or duration any policy knob may express (10 years).
pub const MAX_POLICY_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for the waitlist guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Abuse-prevention limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Email validation knobs
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Cross-origin policy for the signup endpoint
    #[serde(default)]
    pub cors: CorsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Rate limiting policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum recorded signups per identifier within the hourly window (default: 5)
    #[serde(default = "default_per_ip_hourly_limit")]
    pub per_ip_hourly_limit: u32,

    /// Length of the hourly window in seconds (default: 3600)
    #[serde(default = "default_hourly_window_secs")]
    pub hourly_window_secs: u64,

    /// An email may be admitted once per this many seconds (default: 86400)
    #[serde(default = "default_email_window_secs")]
    pub email_window_secs: u64,

    /// Attempts within the burst window that trigger a block (default: 3)
    #[serde(default = "default_burst_limit")]
    pub burst_limit: u32,

    /// Length of the burst window in seconds (default: 60)
    #[serde(default = "default_burst_window_secs")]
    pub burst_window_secs: u64,

    /// How long a burst offender stays blocked, in seconds (default: 3600)
    #[serde(default = "default_block_duration_secs")]
    pub block_duration_secs: u64,

    /// Janitor sweep cadence in seconds (default: 600)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Validation configuration for submitted emails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum normalized email length (default: 254)
    #[serde(default = "default_max_email_len")]
    pub max_email_len: usize,

    /// Maximum number of `+` tags allowed in the address (default: 1)
    #[serde(default = "default_max_plus_tags")]
    pub max_plus_tags: usize,
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Exact origins allowed to call the signup endpoint
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Accept any `http://localhost:<port>` origin (development mode)
    #[serde(default)]
    pub allow_any_localhost: bool,

    /// Preflight cache lifetime in seconds (default: 86400)
    #[serde(default = "default_cors_max_age_secs")]
    pub max_age_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_per_ip_hourly_limit() -> u32 {
    5
}

fn default_hourly_window_secs() -> u64 {
    60 * 60
}

fn default_email_window_secs() -> u64 {
    24 * 60 * 60
}

fn default_burst_limit() -> u32 {
    3
}

fn default_burst_window_secs() -> u64 {
    60
}

fn default_block_duration_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}

fn default_max_email_len() -> usize {
    254
}

fn default_max_plus_tags() -> usize {
    1
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

fn default_cors_max_age_secs() -> u64 {
    24 * 60 * 60
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            limits: LimitsConfig::default(),
            validation: ValidationConfig::default(),
            cors: CorsConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            per_ip_hourly_limit: default_per_ip_hourly_limit(),
            hourly_window_secs: default_hourly_window_secs(),
            email_window_secs: default_email_window_secs(),
            burst_limit: default_burst_limit(),
            burst_window_secs: default_burst_window_secs(),
            block_duration_secs: default_block_duration_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_email_len: default_max_email_len(),
            max_plus_tags: default_max_plus_tags(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_any_localhost: false,
            max_age_secs: default_cors_max_age_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// - `BIND_ADDR`
    /// - `PER_IP_HOURLY_LIMIT`, `HOURLY_WINDOW_SECS`, `EMAIL_WINDOW_SECS`,
    ///   `BURST_LIMIT`, `BURST_WINDOW_SECS`, `BLOCK_DURATION_SECS`,
    ///   `SWEEP_INTERVAL_SECS`
    /// - `CORS_ALLOWED_ORIGINS` (comma separated), `DEV_MODE`
    /// - `METRICS_ENABLED`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = LimitsConfig::default();
        let cors_defaults = CorsConfig::default();

        Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(default_bind_addr),
            limits: LimitsConfig {
                per_ip_hourly_limit: parsed(lookup("PER_IP_HOURLY_LIMIT"))
                    .unwrap_or(defaults.per_ip_hourly_limit),
                hourly_window_secs: parsed(lookup("HOURLY_WINDOW_SECS"))
                    .unwrap_or(defaults.hourly_window_secs),
                email_window_secs: parsed(lookup("EMAIL_WINDOW_SECS"))
                    .unwrap_or(defaults.email_window_secs),
                burst_limit: parsed(lookup("BURST_LIMIT")).unwrap_or(defaults.burst_limit),
                burst_window_secs: parsed(lookup("BURST_WINDOW_SECS"))
                    .unwrap_or(defaults.burst_window_secs),
                block_duration_secs: parsed(lookup("BLOCK_DURATION_SECS"))
                    .unwrap_or(defaults.block_duration_secs),
                sweep_interval_secs: parsed(lookup("SWEEP_INTERVAL_SECS"))
                    .unwrap_or(defaults.sweep_interval_secs),
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|v| split_origins(&v))
                    .unwrap_or(cors_defaults.allowed_origins),
                allow_any_localhost: parsed(lookup("DEV_MODE")).unwrap_or(false),
                ..cors_defaults
            },
            metrics: MetricsConfig {
                enabled: parsed(lookup("METRICS_ENABLED")).unwrap_or(true),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn clamped(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_POLICY_SECS))
}

impl LimitsConfig {
    /// Get the hourly window duration
    pub fn hourly_window(&self) -> Duration {
        clamped(self.hourly_window_secs)
    }

    /// Get the per-email reuse window
    pub fn email_window(&self) -> Duration {
        clamped(self.email_window_secs)
    }

    /// Get the burst window duration
    pub fn burst_window(&self) -> Duration {
        clamped(self.burst_window_secs)
    }

    /// Get the block duration
    pub fn block_duration(&self) -> Duration {
        clamped(self.block_duration_secs)
    }

    /// Get the sweep interval. Never zero, `tokio::time::interval` panics on it.
    pub fn sweep_interval(&self) -> Duration {
        clamped(self.sweep_interval_secs.max(1))
    }

    /// Per-identifier attempts must be kept for the longest window that reads them.
    pub fn attempt_retention(&self) -> Duration {
        self.hourly_window().max(self.burst_window())
    }
}

impl CorsConfig {
    /// Parse the configured origins into an allowlist, dropping (and
    /// warning about) anything that is not an http(s) origin. Call once
    /// at startup.
    pub fn allowlist(&self) -> OriginAllowlist {
        let origins = self
            .allowed_origins
            .iter()
            .filter_map(|raw| match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
                    Some(url)
                }
                _ => {
                    warn!(origin = %raw, "Ignoring malformed CORS origin");
                    None
                }
            })
            .collect();

        OriginAllowlist {
            origins,
            allow_any_localhost: self.allow_any_localhost,
        }
    }
}

/// Parsed CORS origins, checked against every request `Origin` header.
#[derive(Debug, Clone)]
pub struct OriginAllowlist {
    origins: Vec<Url>,
    allow_any_localhost: bool,
}

impl OriginAllowlist {
    pub fn origins(&self) -> &[Url] {
        &self.origins
    }

    /// Whether a request `Origin` header value is allowed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        let Ok(candidate) = Url::parse(origin) else {
            return false;
        };

        if self.allow_any_localhost
            && candidate.scheme() == "http"
            && candidate.host_str() == Some("localhost")
        {
            return true;
        }

        self.origins
            .iter()
            .any(|allowed| allowed.origin() == candidate.origin())
    }
}
