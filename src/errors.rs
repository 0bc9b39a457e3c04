// ABOUTME: Unified error handling with stable error codes and HTTP mapping
// ABOUTME: Provides AppError, ErrorCode, AppResult and the axum IntoResponse bridge
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Unified Error Handling
//!
//! All fallible paths in the crate return [`AppResult`]. Errors carry a
//! stable [`ErrorCode`] that determines the HTTP status when an error
//! escapes a route handler. Callers never see internal detail beyond the
//! message chosen at construction time.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Convenience alias used across the crate
pub type AppResult<T> = Result<T, AppError>;

/// Stable error categories with a fixed HTTP mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or out-of-bounds caller input (400)
    InvalidInput,
    /// Caller identity could not be established (400)
    Unidentified,
    /// Admission quota exhausted (429)
    RateLimited,
    /// Requested entity does not exist (404)
    NotFound,
    /// An upstream dependency failed (502)
    ExternalService,
    /// Server-side configuration problem (500)
    Config,
    /// Unclassified internal failure (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status this code maps to
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::Unidentified => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ExternalService => StatusCode::BAD_GATEWAY,
            Self::Config | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error with a category and caller-safe message
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    /// Error category driving the HTTP mapping
    pub code: ErrorCode,
    /// Caller-safe description of the failure
    pub message: String,
    /// Seconds until retry is allowed, set for rate limit errors only
    pub retry_after_seconds: Option<u64>,
}

impl AppError {
    /// Create an error with an explicit code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retry_after_seconds: None,
        }
    }

    /// Malformed or out-of-bounds caller input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Caller identity could not be established
    #[must_use]
    pub fn unidentified(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unidentified, message)
    }

    /// Admission quota exhausted; `retry_after_seconds` feeds the
    /// `Retry-After` response header
    #[must_use]
    pub fn rate_limited(retry_after_seconds: u64) -> Self {
        Self {
            code: ErrorCode::RateLimited,
            message: "rate limit exceeded, please try again later".into(),
            retry_after_seconds: Some(retry_after_seconds),
        }
    }

    /// Requested entity does not exist
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// An upstream dependency failed
    #[must_use]
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalService, message)
    }

    /// Server-side configuration problem
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    /// Unclassified internal failure
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = Json(json!({ "error": self.message }));

        match self.retry_after_seconds {
            Some(seconds) => {
                (status, [(header::RETRY_AFTER, seconds.to_string())], body).into_response()
            }
            None => (status, body).into_response(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("serialization failed: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::external_service(format!("upstream request failed: {err}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_contract() {
        assert_eq!(
            AppError::invalid_input("bad").code.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unidentified("who").code.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::rate_limited(30).code.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::internal("boom").code.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let err = AppError::rate_limited(30);
        assert_eq!(err.retry_after_seconds, Some(30));
    }
}
