// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Verification of the HS256 bearer tokens issued by the `sign` export.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::errors::ProtocolError;

/// Lifetime of an issued token, in seconds past `issued_at`.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Claims carried by an authorization token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationClaims {
    pub account_info: String,
    pub account_uuid: String,
    pub app_key: String,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl AuthorizationClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Expiry is reported, not enforced; callers decide with their own clock.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Verifies a token (with or without the `Bearer ` prefix) against `secret`.
///
/// Checks the structure, that the header names `HS256`, and the HMAC-SHA256
/// signature over `header.claims`. Returns the decoded claims.
pub fn verify_bearer(token: &str, secret: &[u8]) -> Result<AuthorizationClaims, ProtocolError> {
    let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(c), Some(s), None) => (h, c, s),
            _ => {
                return Err(ProtocolError::InvalidToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };

    let header: TokenHeader = decode_segment("header", header_b64)?;
    if header.alg != "HS256" {
        return Err(ProtocolError::InvalidToken(format!(
            "unsupported algorithm '{}'",
            header.alg
        )));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|e| ProtocolError::InvalidToken(format!("signature: {}", e)))?;
    let signed = &token[..header_b64.len() + 1 + claims_b64.len()];
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| ProtocolError::InvalidToken(e.to_string()))?;
    mac.update(signed.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| ProtocolError::TokenSignatureMismatch)?;

    decode_segment("claims", claims_b64)
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    name: &str,
    segment: &str,
) -> Result<T, ProtocolError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| ProtocolError::InvalidToken(format!("{}: {}", name, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProtocolError::InvalidToken(format!("{}: {}", name, e)))
}
