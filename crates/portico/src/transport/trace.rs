// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation-id and access-log filters.
//!
//! The correlation filter runs before every other filter: it reuses the
//! inbound `correlationId` header when present (idempotent routing for
//! retried clients), otherwise mints a fresh UUID, and installs the id in the
//! request extensions and the tracing span for the whole exchange. The span
//! is torn down on every exit path when the instrumented future drops.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::state::GatewayState;

/// Header carrying the per-request id, inbound and outbound.
pub const CORRELATION_HEADER: &str = "correlationId";

/// Per-request correlation id, readable from the request extensions by every
/// downstream filter and the bridge.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Install the correlation id in extensions, logging context, and the
/// response headers.
pub async fn correlation_layer(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    req.extensions_mut().insert(CorrelationId(id.clone()));

    let span = tracing::info_span!("request", correlation_id = %id);
    let mut response = next.run(req).instrument(span).await;

    if let (Ok(name), Ok(value)) =
        (HeaderName::try_from(CORRELATION_HEADER), HeaderValue::try_from(id))
    {
        response.headers_mut().insert(name, value);
    }
    response
}

/// One log line on entry, one on exit, with status and elapsed milliseconds.
pub async fn access_log_layer(
    State(state): State<Arc<GatewayState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let id = req
        .extensions()
        .get::<CorrelationId>()
        .map(|c| c.0.clone())
        .unwrap_or_default();

    state.metrics.requests_total.fetch_add(1, Ordering::Relaxed);
    let start = std::time::Instant::now();
    tracing::info!(method = %method, path = %path, correlation_id = %id, "request received");

    let response = next.run(req).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        method = %method,
        path = %path,
        correlation_id = %id,
        status = response.status().as_u16(),
        elapsed_ms,
        "request completed"
    );
    response
}
