// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Waitlist Signup Guard Service
//!
//! Guards a public waitlist signup endpoint against spam, duplicate
//! signups and burst traffic from a single source.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `PER_IP_HOURLY_LIMIT`: Signups per identifier per window (default: 5)
//! - `HOURLY_WINDOW_SECS`: Length of that window (default: 3600)
//! - `EMAIL_WINDOW_SECS`: An email may sign up once per window (default: 86400)
//! - `BURST_LIMIT`: Attempts per burst window before blocking (default: 3)
//! - `BURST_WINDOW_SECS`: Length of the burst window (default: 60)
//! - `BLOCK_DURATION_SECS`: Block length after a burst (default: 3600)
//! - `SWEEP_INTERVAL_SECS`: Ledger sweep cadence (default: 600)
//! - `CORS_ALLOWED_ORIGINS`: Comma separated origin allowlist
//! - `DEV_MODE`: Also allow any `http://localhost` origin (default: false)
//! - `METRICS_ENABLED`: Serve `/metrics` (default: true)
//! - `RUST_LOG`: Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use waitlist_guard::{
    config::Config,
    handlers::{router, AppState},
    janitor::Janitor,
    limiter::RateLimiter,
    metrics::GuardMetrics,
    validator::EmailValidator,
    SignupGuard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::from_env();
    info!(
        bind_addr = %config.bind_addr,
        per_ip_hourly_limit = config.limits.per_ip_hourly_limit,
        burst_limit = config.limits.burst_limit,
        block_duration_secs = config.limits.block_duration_secs,
        sweep_interval_secs = config.limits.sweep_interval_secs,
        "Starting waitlist guard"
    );

    let metrics = if config.metrics.enabled {
        Some(GuardMetrics::new()?)
    } else {
        None
    };

    let limiter = Arc::new(RateLimiter::new(config.limits.clone()));
    let mut guard = SignupGuard::new(
        EmailValidator::new(config.validation.clone()),
        limiter.clone(),
    );
    let mut janitor = Janitor::new(limiter, config.limits.sweep_interval());
    if let Some(metrics) = &metrics {
        guard = guard.with_metrics(metrics.clone());
        janitor = janitor.with_metrics(metrics.clone());
    }
    let janitor = janitor.spawn();

    let state = Arc::new(AppState {
        guard,
        config: config.clone(),
        metrics,
    });

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    janitor.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}
