// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bridge;     // host functions + guest memory marshaling
pub mod config;     // host configuration
pub mod errors;     // error handling
pub mod observability;
pub mod pool;       // bounded concurrent signing
pub mod protocol;   // guest request/response protocol
pub mod sandbox;    // registry + instance lifecycle
pub mod signer;     // signing plugin variants
