// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token verification and issuance (HMAC-SHA256 JWT).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::envelope::AuthPrincipal;

/// Minimum key length for HMAC-SHA256, in bytes.
const MIN_SECRET_BYTES: usize = 32;

/// JWT claims the gateway understands. `sub` carries the account id; the
/// optional `accountId` copy wins when present (some issuers set both).
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, rename = "accountId", skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
}

/// Stateless HS256 token verifier/issuer. Holds only the derived keys and the
/// signing expiry window; safe to share across tasks.
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiration: Duration,
}

impl TokenVerifier {
    pub fn new(secret: &str, expiration: Duration) -> anyhow::Result<Self> {
        if secret.len() < MIN_SECRET_BYTES {
            anyhow::bail!("jwt secret must be at least {MIN_SECRET_BYTES} bytes");
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration,
        })
    }

    fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
    }

    /// True iff the signature verifies and `exp` is strictly in the future.
    pub fn validate(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(claims) => claims.exp > epoch_secs(),
            Err(_) => false,
        }
    }

    /// Extract the principal from a token that already passed [`validate`].
    ///
    /// [`validate`]: Self::validate
    pub fn authenticate(&self, token: &str) -> anyhow::Result<AuthPrincipal> {
        let claims = self.decode(token)?;
        if claims.exp <= epoch_secs() {
            anyhow::bail!("token expired");
        }
        Ok(AuthPrincipal {
            account_id: claims.account_id.unwrap_or(claims.sub),
            roles: claims.roles,
            email: claims.email,
            name: claims.name,
        })
    }

    /// Sign a token for the principal with the configured expiry.
    pub fn issue(&self, principal: &AuthPrincipal) -> anyhow::Result<String> {
        let claims = Claims {
            sub: principal.account_id.clone(),
            exp: epoch_secs() + self.expiration.as_secs(),
            roles: principal.roles.clone(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            account_id: Some(principal.account_id.clone()),
        };
        Ok(jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)?)
    }
}

/// Current time as whole seconds since the Unix epoch.
fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
