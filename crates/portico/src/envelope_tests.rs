// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── envelope round-trips ──────────────────────────────────────────────

#[test]
fn request_envelope_round_trips() -> anyhow::Result<()> {
    let envelope = RequestEnvelope {
        path: "/api/recipes/42".to_owned(),
        method: HttpMethod::Post,
        headers: HashMap::from([("accept".to_owned(), "application/json, text/plain".to_owned())]),
        query_params: HashMap::from([("page".to_owned(), "2".to_owned())]),
        body: r#"{"name":"kimchi"}"#.to_owned(),
        principal: Some(AuthPrincipal {
            account_id: "acct-1".to_owned(),
            roles: vec!["USER".to_owned()],
            email: Some("a@b.example".to_owned()),
            name: None,
        }),
    };

    let json = serde_json::to_string(&envelope)?;
    let back: RequestEnvelope = serde_json::from_str(&json)?;
    assert_eq!(back, envelope);
    Ok(())
}

#[test]
fn request_envelope_uses_camel_case_keys() -> anyhow::Result<()> {
    let envelope = RequestEnvelope {
        path: "/x".to_owned(),
        method: HttpMethod::Get,
        headers: HashMap::new(),
        query_params: HashMap::from([("q".to_owned(), "1".to_owned())]),
        body: String::new(),
        principal: None,
    };

    let value: serde_json::Value = serde_json::to_value(&envelope)?;
    assert!(value.get("queryParams").is_some());
    assert_eq!(value["method"], "GET");
    // Absent principal is omitted entirely.
    assert!(value.get("principal").is_none());
    Ok(())
}

#[test]
fn response_envelope_round_trips() -> anyhow::Result<()> {
    let envelope = ResponseEnvelope {
        correlation_id: "C1".to_owned(),
        status_code: 201,
        headers: HashMap::from([("content-type".to_owned(), "application/json".to_owned())]),
        body: r#"{"id":42}"#.to_owned(),
    };

    let json = serde_json::to_string(&envelope)?;
    assert!(json.contains("correlationId"));
    assert!(json.contains("statusCode"));
    let back: ResponseEnvelope = serde_json::from_str(&json)?;
    assert_eq!(back, envelope);
    Ok(())
}

#[test]
fn response_envelope_defaults_optional_fields() -> anyhow::Result<()> {
    let back: ResponseEnvelope =
        serde_json::from_str(r#"{"correlationId":"C2","statusCode":204}"#)?;
    assert_eq!(back.correlation_id, "C2");
    assert_eq!(back.status_code, 204);
    assert!(back.headers.is_empty());
    assert!(back.body.is_empty());
    Ok(())
}

// ── ApiResponse shape ─────────────────────────────────────────────────

#[test]
fn success_envelope_has_null_error() -> anyhow::Result<()> {
    let resp = ApiResponse::success(StatusCode::OK, serde_json::json!({"id": 42}));
    let value = serde_json::to_value(&resp)?;
    assert_eq!(value["status"], 200);
    assert_eq!(value["message"], "OK");
    assert_eq!(value["data"]["id"], 42);
    assert_eq!(value["error"], serde_json::Value::Null);
    Ok(())
}

#[test]
fn failure_envelope_has_err_code() -> anyhow::Result<()> {
    let resp = ApiResponse::failure(StatusCode::GATEWAY_TIMEOUT, "upstream timeout");
    let value = serde_json::to_value(&resp)?;
    assert_eq!(value["status"], 504);
    assert_eq!(value["message"], "Gateway Timeout");
    assert_eq!(value["data"], serde_json::Value::Null);
    assert_eq!(value["error"]["code"], "ERR_504");
    assert_eq!(value["error"]["detail"], "upstream timeout");
    Ok(())
}

// ── method mapping ────────────────────────────────────────────────────

#[test]
fn method_mapping_covers_forwardable_methods() {
    assert_eq!(HttpMethod::from_http(&axum::http::Method::GET), Some(HttpMethod::Get));
    assert_eq!(HttpMethod::from_http(&axum::http::Method::HEAD), Some(HttpMethod::Head));
    assert_eq!(HttpMethod::from_http(&axum::http::Method::TRACE), None);
}

// ── hop-by-hop classification ─────────────────────────────────────────

#[test]
fn hop_by_hop_headers_are_recognised() {
    assert!(is_hop_by_hop("Connection"));
    assert!(is_hop_by_hop("keep-alive"));
    assert!(is_hop_by_hop("Transfer-Encoding"));
    assert!(is_hop_by_hop("Upgrade"));
    assert!(is_hop_by_hop("TE"));
    assert!(is_hop_by_hop("Trailer"));
    assert!(is_hop_by_hop("Proxy-Authorization"));
    assert!(is_hop_by_hop("content-length"));
}

#[test]
fn end_to_end_headers_pass() {
    assert!(!is_hop_by_hop("Content-Type"));
    assert!(!is_hop_by_hop("x-request-id"));
    assert!(!is_hop_by_hop("cache-control"));
}
