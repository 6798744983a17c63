// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Login or verification exhausted its single retry.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// Upstream rejected the session cookie mid-request (HTTP 401).
    #[error("Upstream rejected the session credential")]
    CredentialRejected,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Unexpected upstream response: {0}")]
    UnexpectedUpstreamShape(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors the client should answer with a fresh login.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::AuthFailure(_) | AppError::CredentialRejected)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::AuthFailure(msg) => {
                tracing::warn!(reason = %msg, "Authentication failure surfaced to client");
                (StatusCode::UNAUTHORIZED, "unauthorized", None)
            }
            AppError::CredentialRejected => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::UpstreamUnavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream_unavailable",
                Some(msg.clone()),
            ),
            AppError::UnexpectedUpstreamShape(msg) => {
                tracing::error!(error = %msg, "Unexpected upstream response shape");
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error", None)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
