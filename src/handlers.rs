// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the waitlist guard service.
//!
//! Two ways in:
//!
//! 1. **Signup endpoint**: `POST /api/waitlist` derives the identifier from
//!    the request and answers 200 / 400 / 429 directly.
//! 2. **External check**: `POST /check` lets a fronting application pass
//!    the identifier itself; it always answers 200 with a verdict body.

use crate::config::{Config, CorsConfig};
use crate::error::{retry_secs, SignupError};
use crate::guard::SignupGuard;
use crate::metrics::GuardMetrics;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

/// Identifier used when nothing better can be derived from the request.
pub const FALLBACK_IDENTIFIER: &str = "127.0.0.1";

/// Shared application state.
pub struct AppState {
    pub guard: SignupGuard,
    pub config: Config,
    pub metrics: Option<GuardMetrics>,
}

/// Signup response body.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: &'static str,
    pub email: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// External check request.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub identifier: String,
    #[serde(default)]
    pub email: Option<Value>,
}

/// External check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/waitlist", post(signup))
        .route("/check", post(check));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let cors = cors_layer(&state.config.cors);

    app.layer(SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static("DENY"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    ))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "waitlist-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Signup endpoint. Body: `{"email": "..."}`.
///
/// An unparsable body, a missing field or a non-string value are all
/// treated as a missing email.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SignupResponse>, SignupError> {
    let identifier = client_identifier(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let payload: Option<Value> = serde_json::from_slice(&body).ok();
    let raw_email = payload.as_ref().and_then(|v| v.get("email")).and_then(Value::as_str);

    let email = state.guard.submit(&identifier, raw_email, Utc::now()).await?;

    Ok(Json(SignupResponse {
        success: true,
        message: "Thanks for joining the waitlist!",
        email: email.into_inner(),
    }))
}

/// Check a signup attempt on behalf of a fronting application.
///
/// Admission records the attempt, exactly as the signup endpoint does.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Json<CheckResponse> {
    debug!(identifier = %req.identifier, "Processing signup check");

    let raw_email = req.email.as_ref().and_then(Value::as_str);
    let response = match state.guard.submit(&req.identifier, raw_email, Utc::now()).await {
        Ok(email) => CheckResponse {
            allowed: true,
            email: Some(email.into_inner()),
            code: None,
            reason: None,
            retry_after_secs: None,
        },
        Err(err) => CheckResponse {
            allowed: false,
            email: None,
            code: Some(err.code()),
            reason: Some(err.to_string()),
            retry_after_secs: err.retry_after().map(retry_secs),
        },
    };

    Json(response)
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    metrics.observe_state(&state.guard.limiter().stats(Utc::now()).await);

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics.render(),
    )
        .into_response()
}

/// Derive the grouping identifier for a request: first `X-Forwarded-For`
/// hop, then `X-Real-IP`, then the peer address.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(first) = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header_str(headers, "x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| FALLBACK_IDENTIFIER.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowlist = config.allowlist();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| allowlist.is_allowed(o))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_secs))
}
