// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Status codes and payload encoding for guest operation exports.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::errors::{ExecutionError, ProtocolError, SigboxResult};

/// The export succeeded; the output channel holds the response.
pub const STATUS_OK: i32 = 0;
/// The export failed; the output channel holds an error message.
pub const STATUS_GUEST_FAILURE: i32 = 1;
/// The request did not parse; the output channel holds an error message.
pub const STATUS_MALFORMED_REQUEST: i32 = 2;

/// Turns an export's status and output channel into the call result.
///
/// Unknown non-zero statuses are treated as guest failures.
pub fn interpret_status(export: &str, status: i32, output: Vec<u8>) -> SigboxResult<Vec<u8>> {
    match status {
        STATUS_OK => Ok(output),
        STATUS_MALFORMED_REQUEST => Err(ProtocolError::MalformedRequest(message(&output)).into()),
        _ => Err(ExecutionError::GuestFailure {
            export: export.to_string(),
            status,
            message: message(&output),
        }
        .into()),
    }
}

fn message(output: &[u8]) -> String {
    String::from_utf8_lossy(output).into_owned()
}

pub fn encode_request<T: Serialize>(request: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(request).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Rejects request bytes that are not a JSON document.
pub fn ensure_json(request: &[u8]) -> Result<(), ProtocolError> {
    serde_json::from_slice::<IgnoredAny>(request)
        .map(|_| ())
        .map_err(|e| ProtocolError::MalformedRequest(e.to_string()))
}

pub fn decode_json<T: DeserializeOwned>(export: &str, output: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(output).map_err(|e| ProtocolError::InvalidResponse {
        export: export.to_string(),
        reason: e.to_string(),
    })
}

/// Parses an output channel holding a base-10 integer.
pub fn decode_decimal(export: &str, output: &[u8]) -> Result<i64, ProtocolError> {
    let invalid = |reason: String| ProtocolError::InvalidResponse {
        export: export.to_string(),
        reason,
    };
    let text = std::str::from_utf8(output).map_err(|e| invalid(e.to_string()))?;
    text.parse::<i64>()
        .map_err(|e| invalid(format!("'{}' is not a decimal integer: {}", text, e)))
}
