// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Error types for signup decisions.

use crate::limiter::DenyReason;
use crate::validator::ValidationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a signup attempt was rejected. Always a user-facing outcome, never
/// a system fault.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignupError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{reason}")]
    RateLimited {
        reason: DenyReason,
        retry_after: Duration,
    },
}

impl SignupError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::RateLimited { reason, .. } => reason.code(),
        }
    }

    /// HTTP status the signup endpoint should answer with.
    pub fn status_hint(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Validation(_) => None,
            Self::RateLimited { retry_after, .. } => Some(*retry_after),
        }
    }

    /// Whether the identifier is serving an escalated suspension.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::RateLimited {
                reason: DenyReason::Blocked | DenyReason::Burst,
                ..
            }
        )
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Round up so clients never retry a second early.
pub(crate) fn retry_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let retry_after_secs = self.retry_after().map(retry_secs);
        let body = Json(ErrorResponse {
            success: false,
            message: self.to_string(),
            code: self.code(),
            retry_after_secs,
        });

        match retry_after_secs {
            Some(secs) => (
                self.status_hint(),
                [(header::RETRY_AFTER, secs.to_string())],
                body,
            )
                .into_response(),
            None => (self.status_hint(), body).into_response(),
        }
    }
}
