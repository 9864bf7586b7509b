// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn verifier() -> TokenVerifier {
    match TokenVerifier::new(SECRET, Duration::from_secs(3600)) {
        Ok(v) => v,
        Err(e) => panic!("verifier construction failed: {e}"),
    }
}

fn principal() -> AuthPrincipal {
    AuthPrincipal {
        account_id: "acct-7".to_owned(),
        roles: vec!["USER".to_owned(), "ADMIN".to_owned()],
        email: Some("seven@example.com".to_owned()),
        name: Some("Seven".to_owned()),
    }
}

// ── construction ──────────────────────────────────────────────────────

#[test]
fn short_secret_is_rejected() {
    assert!(TokenVerifier::new("too-short", Duration::from_secs(60)).is_err());
}

// ── issue + validate ──────────────────────────────────────────────────

#[test]
fn issued_token_validates_and_authenticates() -> anyhow::Result<()> {
    let verifier = verifier();
    let token = verifier.issue(&principal())?;

    assert!(verifier.validate(&token));
    let back = verifier.authenticate(&token)?;
    assert_eq!(back, principal());
    Ok(())
}

#[test]
fn sub_is_the_account_id_fallback() -> anyhow::Result<()> {
    let verifier = verifier();
    // Hand-build claims without the accountId convenience copy.
    let claims = serde_json::json!({
        "sub": "from-sub",
        "exp": epoch_secs() + 600,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )?;

    let principal = verifier.authenticate(&token)?;
    assert_eq!(principal.account_id, "from-sub");
    assert!(principal.roles.is_empty());
    Ok(())
}

// ── rejection paths ───────────────────────────────────────────────────

#[test]
fn tampered_signature_fails() -> anyhow::Result<()> {
    let verifier = verifier();
    let token = verifier.issue(&principal())?;

    // Flip the last signature character.
    let mut tampered = token.clone();
    let last = if tampered.ends_with('A') { 'B' } else { 'A' };
    tampered.pop();
    tampered.push(last);

    assert!(!verifier.validate(&tampered));
    assert!(verifier.authenticate(&tampered).is_err());
    Ok(())
}

#[test]
fn tampered_payload_fails() -> anyhow::Result<()> {
    let verifier = verifier();
    let token = verifier.issue(&principal())?;

    // Swap the payload segment for one claiming a different subject.
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    let other = verifier.issue(&AuthPrincipal {
        account_id: "intruder".to_owned(),
        roles: vec![],
        email: None,
        name: None,
    })?;
    let other_parts: Vec<&str> = other.split('.').collect();
    let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

    assert!(!verifier.validate(&forged));
    Ok(())
}

#[test]
fn expired_token_fails() -> anyhow::Result<()> {
    let verifier = verifier();
    let claims = serde_json::json!({
        "sub": "late",
        "exp": epoch_secs() - 10,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )?;

    assert!(!verifier.validate(&token));
    assert!(verifier.authenticate(&token).is_err());
    Ok(())
}

#[test]
fn wrong_secret_fails() -> anyhow::Result<()> {
    let verifier = verifier();
    let other = TokenVerifier::new("ffffffffffffffffffffffffffffffff", Duration::from_secs(60))?;
    let token = other.issue(&principal())?;
    assert!(!verifier.validate(&token));
    Ok(())
}

#[test]
fn garbage_token_fails() {
    let verifier = verifier();
    assert!(!verifier.validate("not.a.jwt"));
    assert!(!verifier.validate(""));
}
