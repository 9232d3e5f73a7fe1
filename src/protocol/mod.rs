// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest plugin protocol.
//!
//! Every operation export has the signature `(input_ptr: i32, input_len: i32) -> i32`.
//! The host copies the JSON request into a buffer from the guest's `allocate`, calls
//! the export and reads the output channel through `output_ptr()`/`output_len()`.
//! The returned status says how to read that channel; see `codec`.

pub mod codec;
pub mod types;

pub use codec::{
    decode_decimal, decode_json, encode_request, ensure_json, interpret_status, STATUS_GUEST_FAILURE,
    STATUS_MALFORMED_REQUEST, STATUS_OK,
};
pub use types::{AddRequest, DigestRequest, SignInput, SignOutput};
