// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed HTTP endpoints served by the gateway itself.

use std::fmt::Write as _;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::envelope::ApiResponse;
use crate::state::GatewayState;

/// `GET /api/health`
pub async fn health(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let data = serde_json::json!({
        "service": "portico",
        "instanceId": state.instance_id,
        "inFlight": state.registry.in_flight(),
    });
    Json(ApiResponse::success(StatusCode::OK, data))
}

/// `GET /actuator/prometheus`
pub async fn prometheus(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(&state),
    )
}

fn render_metrics(state: &GatewayState) -> String {
    let registry = state.registry.counters();
    let counters = [
        ("portico_requests_total", state.metrics.requests_total.load(Ordering::Relaxed)),
        ("portico_published_total", state.metrics.published_total.load(Ordering::Relaxed)),
        (
            "portico_broker_rejected_total",
            state.metrics.broker_rejected_total.load(Ordering::Relaxed),
        ),
        ("portico_replies_delivered_total", registry.delivered.load(Ordering::Relaxed)),
        ("portico_orphan_replies_total", registry.orphaned.load(Ordering::Relaxed)),
        ("portico_late_replies_total", registry.late.load(Ordering::Relaxed)),
        ("portico_timeouts_total", registry.timed_out.load(Ordering::Relaxed)),
        ("portico_cancelled_total", registry.cancelled.load(Ordering::Relaxed)),
    ];

    let mut out = String::new();
    for (name, value) in counters {
        let _ = writeln!(out, "# TYPE {name} counter");
        let _ = writeln!(out, "{name} {value}");
    }
    let _ = writeln!(out, "# TYPE portico_in_flight gauge");
    let _ = writeln!(out, "portico_in_flight {}", state.registry.in_flight());
    out
}
