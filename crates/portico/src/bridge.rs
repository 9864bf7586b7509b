// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP↔broker bridge: turns one HTTP exchange into one published request
//! envelope plus one awaited reply envelope.
//!
//! The bridge is the fallback handler behind the fixed routes — every path is
//! resolved against the route table, published to the services exchange with
//! the resolved routing key, and answered from the correlated reply. Admission
//! onto the outbound publish buffer happens *before* a slot is registered, so
//! a saturated or disabled broker fails fast with 503 and leaves no state
//! behind.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::envelope::{
    is_hop_by_hop, ApiResponse, AuthPrincipal, HttpMethod, RequestEnvelope, ResponseEnvelope,
};
use crate::error::GatewayError;
use crate::registry::{AwaitOutcome, RegisterError};
use crate::state::{GatewayState, OutboundMessage};
use crate::transport::trace::CorrelationId;

/// Fallback handler: bridge the request to the broker and await the reply.
pub async fn forward(State(state): State<Arc<GatewayState>>, req: Request) -> Response {
    match bridge(&state, req).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn bridge(state: &GatewayState, req: Request) -> Result<Response, GatewayError> {
    let path = req.uri().path().to_owned();
    let routing_key =
        state.routes.resolve(&path).ok_or(GatewayError::NotFound)?.to_owned();
    let method = HttpMethod::from_http(req.method())
        .ok_or_else(|| GatewayError::BadRequest(format!("method {} not forwardable", req.method())))?;

    let correlation_id = req
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let trace_id = header_string(req.headers(), "traceId");
    let principal = req.extensions().get::<AuthPrincipal>().cloned();
    let headers = join_headers(req.headers());
    let query_params = collapse_query(req.uri().query());
    let content_type = header_string(req.headers(), "content-type");

    // Suspension point one: buffer the body, bounded by the configured cap.
    let body_bytes = axum::body::to_bytes(req.into_body(), state.config.max_body_bytes)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge)?;
    let body = String::from_utf8(body_bytes.to_vec())
        .map_err(|_| GatewayError::BadRequest("request body is not valid UTF-8".to_owned()))?;

    if !body.is_empty() && body_loggable(content_type.as_deref()) {
        debug!(correlation_id = %correlation_id, body = %body, "request body");
    }

    let envelope = RequestEnvelope { path, method, headers, query_params, body, principal };
    let payload = serde_json::to_vec(&envelope)
        .map_err(|e| GatewayError::Internal(format!("envelope encoding failed: {e}")))?;

    // Fail fast while no slot exists yet: the publish buffer is the
    // backpressure signal.
    let permit = state.outbound.try_reserve().map_err(|_| {
        state.metrics.broker_rejected_total.fetch_add(1, Ordering::Relaxed);
        GatewayError::BrokerUnavailable("broker publish buffer unavailable".to_owned())
    })?;

    let slot = state
        .registry
        .register(correlation_id.clone(), state.config.request_timeout())
        .map_err(|e| match e {
            RegisterError::Duplicate => {
                GatewayError::Internal(format!("correlation id collision: {correlation_id}"))
            }
            RegisterError::Full => {
                state.metrics.broker_rejected_total.fetch_add(1, Ordering::Relaxed);
                GatewayError::BrokerUnavailable("too many requests in flight".to_owned())
            }
        })?;

    permit.send(OutboundMessage {
        routing_key,
        correlation_id,
        trace_id,
        payload: Bytes::from(payload),
    });
    state.metrics.published_total.fetch_add(1, Ordering::Relaxed);

    // Suspension point two: the single-shot reply slot. The handle
    // deregisters itself on every exit path, including future drop.
    match slot.await_reply(&state.shutdown).await {
        AwaitOutcome::Reply(envelope) => Ok(encode_reply(envelope)),
        AwaitOutcome::TimedOut => Err(GatewayError::UpstreamTimeout),
        AwaitOutcome::Cancelled => {
            Err(GatewayError::BrokerUnavailable("gateway shutting down".to_owned()))
        }
    }
}

// -- Request encoding ---------------------------------------------------------

/// Copy headers into the envelope, comma-joining multi-valued ones. Keys come
/// out in canonical lowercase form.
fn join_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for key in headers.keys() {
        let joined = headers
            .get_all(key)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(key.as_str().to_owned(), joined);
    }
    map
}

/// Collapse the query string to first-value-per-name.
fn collapse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Some(query) = query else { return map };
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        map.entry(name.to_owned()).or_insert_with(|| value.to_owned());
    }
    map
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_owned)
}

// -- Body logging -------------------------------------------------------------

const UNLOGGED_CONTENT_TYPES: &[&str] =
    &["multipart/form-data", "application/octet-stream", "application/pdf"];
const UNLOGGED_PREFIXES: &[&str] = &["image/", "video/", "audio/"];

/// Whether a request body with this content type may appear in debug logs.
fn body_loggable(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else { return true };
    let media = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    !(UNLOGGED_CONTENT_TYPES.contains(&media.as_str())
        || UNLOGGED_PREFIXES.iter().any(|prefix| media.starts_with(prefix)))
}

// -- Response encoding --------------------------------------------------------

/// Out-of-range reply status codes are clamped to 502.
fn clamp_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code)
        .ok()
        .filter(|status| (100..=599).contains(&status.as_u16()))
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Embed a reply body into the `data` field: parsed when it is JSON, a plain
/// string otherwise, null when empty.
fn embed_body(body: &str) -> serde_json::Value {
    if body.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_owned()))
}

/// Translate a reply envelope into the client-facing HTTP response.
fn encode_reply(envelope: ResponseEnvelope) -> Response {
    let status = clamp_status(envelope.status_code);
    let api = if status.is_success() {
        ApiResponse::success(status, embed_body(&envelope.body))
    } else {
        ApiResponse::failure(status, envelope.body.clone())
    };
    let payload = serde_json::to_vec(&api).unwrap_or_default();

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    for (name, value) in &envelope.headers {
        if is_hop_by_hop(name) {
            continue;
        }
        let (Ok(name), Ok(value)) =
            (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str()))
        else {
            warn!(header = %name, "dropping unrepresentable reply header");
            continue;
        };
        response.headers_mut().insert(name, value);
    }
    if !response.headers().contains_key(CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    response
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
