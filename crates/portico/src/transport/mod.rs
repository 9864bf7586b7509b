// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport and broker plumbing for the gateway.

pub mod auth;
pub mod http;
pub mod nats_pub;
pub mod nats_sub;
pub mod trace;

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::GatewayState;

/// Build the axum `Router`.
///
/// Every path not claimed by a fixed endpoint falls through to the bridge.
/// Filter order (outermost first): CORS, correlation id, access log, auth.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Gateway-owned endpoints (no auth)
        .route("/api/health", get(http::health))
        .route("/actuator/prometheus", get(http::prometheus))
        // Everything else is bridged to the broker
        .fallback(crate::bridge::forward)
        // Middleware (layering is inside-out: last added runs first)
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(middleware::from_fn_with_state(state.clone(), trace::access_log_layer))
        .layer(middleware::from_fn(trace::correlation_layer))
        .layer(cors)
        .with_state(state)
}
