// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps [`legion_core::error::OrchestratorError`] onto HTTP status codes and
//! the wire error envelope, the way the teacher's `MuxError` carries its own
//! `http_status`/`to_http_response` pair.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use legion_core::error::OrchestratorError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

fn http_status(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::NotFound { .. } => StatusCode::NOT_FOUND,
        OrchestratorError::InvalidTransition { .. } | OrchestratorError::ValidationFailure { .. } => {
            StatusCode::BAD_REQUEST
        }
        OrchestratorError::OcrUnavailable | OrchestratorError::DriverFault { .. } => {
            StatusCode::BAD_GATEWAY
        }
        OrchestratorError::OcrNoMatch | OrchestratorError::Timeout { .. } => StatusCode::CONFLICT,
        OrchestratorError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wrap a dispatch failure into an axum response carrying the taxonomy's
/// stable wire code plus the `Display` message.
pub fn into_response(err: OrchestratorError) -> Response {
    let status = http_status(&err);
    let body = ErrorResponse { error: ErrorBody { code: err.code().to_owned(), message: err.to_string() } };
    (status, Json(body)).into_response()
}

/// `401` for a missing or wrong bearer token, matching the error envelope
/// shape used for taxonomy errors.
pub fn unauthorized() -> Response {
    let body = ErrorResponse {
        error: ErrorBody { code: "UNAUTHORIZED".to_owned(), message: "unauthorized".to_owned() },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
