// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP error responses.
//!
//! Every handler failure becomes an [`ApiError`]: an HTTP status plus a
//! stable machine-readable code and a human-readable message, rendered
//! as a JSON body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inflow_core::error::{TransportError, WorkflowError};
use serde::Serialize;
use tracing::error;

/// A request failure with a stable error code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with the given code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 404 for a record that is not in the log.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "RECORD_NOT_FOUND", message)
    }

    /// 502 for a failure in the storage layer behind the server.
    pub fn bad_gateway(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, code, message)
    }

    /// 503 for a transport that is not currently usable.
    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    /// 500 for failures the client cannot do anything about.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        }
        let body = ApiErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::Validation { reason } => Self::bad_request("VALIDATION_FAILED", reason),
            WorkflowError::Storage(source) => {
                Self::bad_gateway("STORAGE_FAILED", source.to_string())
            }
            WorkflowError::Cancelled => {
                Self::unavailable("SHUTTING_DOWN", "server is shutting down")
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        Self::unavailable("TRANSPORT_UNAVAILABLE", error.to_string())
    }
}
