// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// ── decode_reply ──────────────────────────────────────────────────────

#[test]
fn header_correlation_id_wins() {
    let payload = br#"{"correlationId":"body-id","statusCode":200}"#;
    let mut headers = async_nats::HeaderMap::new();
    headers.insert(CORRELATION_HEADER, "header-id");

    let Some((id, envelope)) = decode_reply(payload, Some(&headers)) else {
        panic!("expected a decoded reply");
    };
    assert_eq!(id, "header-id");
    assert_eq!(envelope.status_code, 200);
}

#[test]
fn body_correlation_id_is_the_fallback() {
    let payload = br#"{"correlationId":"body-id","statusCode":204}"#;

    let Some((id, _)) = decode_reply(payload, None) else {
        panic!("expected a decoded reply");
    };
    assert_eq!(id, "body-id");
}

#[test]
fn malformed_payload_is_dropped() {
    assert!(decode_reply(b"not json", None).is_none());
    assert!(decode_reply(br#"{"statusCode":"not-a-number"}"#, None).is_none());
}

#[test]
fn headers_without_correlation_fall_back_to_body() {
    let payload = br#"{"correlationId":"body-id","statusCode":200}"#;
    let headers = async_nats::HeaderMap::new();

    let Some((id, _)) = decode_reply(payload, Some(&headers)) else {
        panic!("expected a decoded reply");
    };
    assert_eq!(id, "body-id");
}
