// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! HS256 bearer tokens signed through the host digest.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Serialize;

use crate::abi::PluginError;
use crate::host::KeyedDigest;

/// Seconds a token stays valid after `issued_at`.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Field order is the serialized order.
#[derive(Debug, Serialize)]
pub struct Claims<'a> {
    pub account_info: &'a str,
    pub account_uuid: &'a str,
    pub app_key: &'a str,
    pub exp: i64,
}

/// Encodes `header.claims.signature`, each segment base64url without padding.
pub fn issue(claims: &Claims<'_>, secret: &[u8], digest: &dyn KeyedDigest) -> Result<String, PluginError> {
    let claims_json =
        serde_json::to_vec(claims).map_err(|e| PluginError::Failed(e.to_string()))?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(HEADER),
        URL_SAFE_NO_PAD.encode(claims_json)
    );
    let signature = digest.hmac256(secret, signing_input.as_bytes())?;
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}
