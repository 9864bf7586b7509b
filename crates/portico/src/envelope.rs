// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types shared between the gateway and its backend services.
//!
//! A `RequestEnvelope` is what the gateway publishes to the services exchange;
//! a `ResponseEnvelope` is what a service publishes back to the gateway's
//! reply subject. The correlation id and reply subject travel as broker
//! message headers, never inside the JSON body. `ApiResponse` is the
//! standardised JSON envelope the gateway emits to HTTP clients.

use std::collections::HashMap;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

// -- HTTP method --------------------------------------------------------------

/// The subset of HTTP methods the gateway forwards to services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    /// Map an HTTP method onto the wire enum. `None` for methods the gateway
    /// does not forward (CONNECT, TRACE, extensions).
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        match *method {
            axum::http::Method::GET => Some(Self::Get),
            axum::http::Method::POST => Some(Self::Post),
            axum::http::Method::PUT => Some(Self::Put),
            axum::http::Method::PATCH => Some(Self::Patch),
            axum::http::Method::DELETE => Some(Self::Delete),
            axum::http::Method::OPTIONS => Some(Self::Options),
            axum::http::Method::HEAD => Some(Self::Head),
            _ => None,
        }
    }
}

// -- Authenticated identity ---------------------------------------------------

/// Identity extracted from a validated bearer token, attached to the request
/// context by the auth filter and forwarded to services inside the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPrincipal {
    pub account_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// -- Request / response envelopes ---------------------------------------------

/// What the gateway publishes to a service.
///
/// Header values are comma-joined; query parameters are collapsed to their
/// first value. Keys are written in canonical (lowercase) form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query_params: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<AuthPrincipal>,
}

/// What a service publishes back to the gateway's reply subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub correlation_id: String,
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

// -- Client-facing response envelope ------------------------------------------

/// Machine-readable error payload inside an `ApiResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub detail: String,
}

/// The standardised JSON envelope returned to HTTP clients.
///
/// `status` mirrors the HTTP status line; on 2xx `data` carries the payload
/// and `error` is null, otherwise `data` is null and `error` carries
/// `code = "ERR_<status>"` plus a detail string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

impl ApiResponse<serde_json::Value> {
    /// Success envelope for a 2xx status.
    pub fn success(status: StatusCode, data: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            message: reason_phrase(status),
            data: Some(data),
            error: None,
        }
    }

    /// Error envelope for any non-2xx status.
    pub fn failure(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: reason_phrase(status),
            data: None,
            error: Some(ErrorBody {
                code: format!("ERR_{}", status.as_u16()),
                detail: detail.into(),
            }),
        }
    }
}

/// Canonical reason phrase for a status code ("OK", "Gateway Timeout", ...).
pub fn reason_phrase(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_owned()
}

// -- Hop-by-hop headers -------------------------------------------------------

const HOP_BY_HOP: &[&str] =
    &["connection", "keep-alive", "transfer-encoding", "upgrade", "te", "trailer"];

/// Whether a response header applies only to a single transport hop and must
/// not be forwarded to the client. `content-length` is treated the same way
/// since the gateway rewraps the body.
pub fn is_hop_by_hop(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    HOP_BY_HOP.contains(&lower.as_str())
        || lower.starts_with("proxy-")
        || lower == "content-length"
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
