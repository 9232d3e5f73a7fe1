// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The three signing operations, independent of the export glue.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::PluginError;
use crate::host::KeyedDigest;
use crate::token::{self, Claims, TOKEN_LIFETIME_SECS};

const ACCOUNT_UUID_HEADER: &str = "X-Account-UUID";
const ACCOUNT_INFO_HEADER: &str = "X-Account-Info";

#[derive(Debug, Deserialize)]
struct AddRequest {
    a: i64,
    b: i64,
}

#[derive(Deserialize)]
struct DigestRequest {
    key: String,
    to_sign_string: String,
}

/// The parts of a sign request this plugin reads; other fields are ignored.
#[derive(Deserialize)]
struct SignInput {
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    access_key: String,
    #[serde(default)]
    secret_key: String,
    issued_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct SignOutput {
    additional_headers: BTreeMap<String, String>,
}

/// Requests must be JSON objects; serde would otherwise accept an array in field order.
fn parse<T: DeserializeOwned>(input: &[u8]) -> Result<T, PluginError> {
    let value: Value =
        serde_json::from_slice(input).map_err(|e| PluginError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(PluginError::Malformed(
            "request must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| PluginError::Malformed(e.to_string()))
}

/// `{"a","b"}` → decimal string of `a + b`.
pub fn add(input: &[u8]) -> Result<Vec<u8>, PluginError> {
    let request: AddRequest = parse(input)?;
    let sum = request
        .a
        .checked_add(request.b)
        .ok_or_else(|| PluginError::Failed(format!("{} + {} overflows i64", request.a, request.b)))?;
    Ok(sum.to_string().into_bytes())
}

/// `{"key","to_sign_string"}` → raw HMAC-SHA256 bytes from the host.
pub fn hmac256_demo(input: &[u8], digest: &dyn KeyedDigest) -> Result<Vec<u8>, PluginError> {
    let request: DigestRequest = parse(input)?;
    digest.hmac256(request.key.as_bytes(), request.to_sign_string.as_bytes())
}

/// Sign input → `{"additional_headers":{"Authorization":"Bearer <token>"}}`.
pub fn sign(input: &[u8], digest: &dyn KeyedDigest) -> Result<Vec<u8>, PluginError> {
    let request: SignInput = parse(input)?;
    let header = |name: &str| request.headers.get(name).map(String::as_str).unwrap_or("");

    let claims = Claims {
        account_info: header(ACCOUNT_INFO_HEADER),
        account_uuid: header(ACCOUNT_UUID_HEADER),
        app_key: &request.access_key,
        exp: request.issued_at.timestamp() + TOKEN_LIFETIME_SECS,
    };
    let token = token::issue(&claims, request.secret_key.as_bytes(), digest)?;

    let mut additional_headers = BTreeMap::new();
    additional_headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    serde_json::to_vec(&SignOutput { additional_headers })
        .map_err(|e| PluginError::Failed(e.to_string()))
}
