// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Message types follow a struct-based pattern with a `Display` implementation and
//! are logged through `tracing`:
//!
//! ```rust
//! use sigbox::observability::messages::instance::CallFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "guest trap");
//! let msg = CallFailed {
//!     artifact: "signer",
//!     export: "sign",
//!     error: &error,
//! };
//!
//! tracing::warn!("{}", msg);
//! ```
//!
//! Secret keys, key bytes, request bodies and issued tokens are never passed to a
//! message type. `init_tracing` is for binaries; libraries only emit events.

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
