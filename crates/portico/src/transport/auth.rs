// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::envelope::AuthPrincipal;
use crate::error::GatewayError;
use crate::state::GatewayState;

/// Path prefixes that never require authentication.
const PERMITTED_PREFIXES: &[&str] = &["/api/auth", "/actuator", "/v3/api-docs", "/swagger-ui"];

/// Exact paths that never require authentication.
const PERMITTED_PATHS: &[&str] = &["/api/health"];

/// Whether a path is reachable without a principal.
pub fn is_permitted(path: &str) -> bool {
    PERMITTED_PATHS.contains(&path)
        || PERMITTED_PREFIXES.iter().any(|prefix| {
            path == *prefix
                || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
        })
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// The prefix match is case-sensitive with a single space.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// Axum middleware enforcing bearer-token authentication.
///
/// A valid token attaches an [`AuthPrincipal`] to the request extensions; an
/// invalid or absent token leaves the request anonymous. Anonymous requests
/// to non-permitted paths are rejected with 401 before reaching the bridge.
pub async fn auth_layer(
    State(state): State<Arc<GatewayState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers()).map(str::to_owned);
    if let Some(token) = token {
        if state.verifier.validate(&token) {
            match state.verifier.authenticate(&token) {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                }
                Err(e) => debug!(err = %e, "token claims rejected"),
            }
        } else {
            debug!("bearer token failed validation");
        }
    }

    if !is_permitted(req.uri().path()) && req.extensions().get::<AuthPrincipal>().is_none() {
        return GatewayError::Unauthorized.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
