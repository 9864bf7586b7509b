// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── permit table ──────────────────────────────────────────────────────

#[test]
fn auth_free_paths_are_permitted() {
    assert!(is_permitted("/api/health"));
    assert!(is_permitted("/api/auth/login"));
    assert!(is_permitted("/api/auth"));
    assert!(is_permitted("/actuator/prometheus"));
    assert!(is_permitted("/v3/api-docs"));
    assert!(is_permitted("/swagger-ui/index.html"));
}

#[test]
fn protected_paths_are_not_permitted() {
    assert!(!is_permitted("/api/recipes/42"));
    assert!(!is_permitted("/api/account"));
    assert!(!is_permitted("/"));
    // Prefix matches stop at segment boundaries.
    assert!(!is_permitted("/api/authx"));
    assert!(!is_permitted("/api/healthz"));
}

// ── bearer extraction ─────────────────────────────────────────────────

#[test]
fn bearer_token_is_extracted() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, axum::http::HeaderValue::from_static("Bearer abc.def.ghi"));
    assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
}

#[test]
fn non_bearer_schemes_are_ignored() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, axum::http::HeaderValue::from_static("Basic dXNlcjpwYXNz"));
    assert_eq!(bearer_token(&headers), None);
}

#[test]
fn bearer_prefix_is_case_sensitive() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, axum::http::HeaderValue::from_static("bearer abc"));
    assert_eq!(bearer_token(&headers), None);
}

#[test]
fn missing_header_yields_none() {
    assert_eq!(bearer_token(&HeaderMap::new()), None);
}
