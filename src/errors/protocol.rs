// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Malformed or schema-mismatched JSON at the guest boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request is not valid JSON, or the guest rejected it as malformed.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// A successful status came back with output that does not match the schema.
    #[error("Invalid response from '{export}': {reason}")]
    InvalidResponse { export: String, reason: String },

    /// The request could not be serialized.
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// The request variant does not match the configured signer.
    #[error("Signer is configured as '{configured}' but received a '{requested}' request")]
    VariantMismatch {
        configured: String,
        requested: String,
    },

    /// A bearer token is structurally invalid.
    #[error("Invalid bearer token: {0}")]
    InvalidToken(String),

    /// A bearer token's signature does not match the secret key.
    #[error("Bearer token signature mismatch")]
    TokenSignatureMismatch,
}
