// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request and response payloads for the signing operations.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request for the `add` export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRequest {
    pub a: i64,
    pub b: i64,
}

/// Request for the `hmac256_demo` export.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRequest {
    pub key: String,
    pub to_sign_string: String,
}

impl DigestRequest {
    pub fn new(key: impl Into<String>, to_sign_string: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            to_sign_string: to_sign_string.into(),
        }
    }
}

impl fmt::Debug for DigestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestRequest")
            .field("key", &"<redacted>")
            .field("to_sign_string", &self.to_sign_string)
            .finish()
    }
}

/// Request for the `sign` export: an outgoing HTTP request plus credentials.
///
/// `issued_at` is supplied by the caller; the guest never reads a clock.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInput {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub url: String,
    /// Base64 (standard alphabet) on the wire.
    #[serde(default, with = "base64_body")]
    pub body: Vec<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<BTreeMap<String, String>>,
}

impl SignInput {
    pub fn new(method: impl Into<String>, url: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            method: method.into(),
            headers: BTreeMap::new(),
            url: url.into(),
            body: Vec::new(),
            access_key: String::new(),
            secret_key: String::new(),
            token: None,
            issued_at,
            extra: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for SignInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInput")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("issued_at", &self.issued_at)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Response of the `sign` export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutput {
    #[serde(default)]
    pub additional_headers: BTreeMap<String, String>,
}

impl SignOutput {
    pub fn authorization(&self) -> Option<&str> {
        self.additional_headers.get("Authorization").map(String::as_str)
    }

    /// The token from a `Bearer` authorization header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization()?.strip_prefix("Bearer ")
    }
}

mod base64_body {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD.decode(encoded).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
