// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::envelope::ApiResponse;

/// Failure kinds surfaced by the gateway, each mapped to one HTTP status.
///
/// Every variant renders as the standard `ApiResponse` error envelope with
/// `error.code = "ERR_<status>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Malformed request (bad method, non-UTF-8 body, unreadable body).
    BadRequest(String),
    /// Missing or invalid bearer token on a protected path.
    Unauthorized,
    /// No route prefix matches the request path.
    NotFound,
    /// Request body exceeds the configured buffer cap.
    PayloadTooLarge,
    /// No reply arrived within the per-request deadline.
    UpstreamTimeout,
    /// The outbound publish path rejected the request (buffer full, broker
    /// disabled, or the in-flight ceiling was hit).
    BrokerUnavailable(String),
    /// Unexpected internal failure; logged with the request id.
    Internal(String),
}

impl GatewayError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::BrokerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, always derived from the status.
    pub fn code(&self) -> String {
        format!("ERR_{}", self.http_status().as_u16())
    }

    /// Human-readable detail for the error envelope.
    pub fn detail(&self) -> String {
        match self {
            Self::BadRequest(detail) => detail.clone(),
            Self::Unauthorized => "authentication required".to_owned(),
            Self::NotFound => "no route for path".to_owned(),
            Self::PayloadTooLarge => "request body exceeds the configured limit".to_owned(),
            Self::UpstreamTimeout => "upstream timeout".to_owned(),
            Self::BrokerUnavailable(detail) => detail.clone(),
            Self::Internal(detail) => detail.clone(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.detail())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = ApiResponse::failure(status, self.detail());
        (status, Json(body)).into_response()
    }
}
