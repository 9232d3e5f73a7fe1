// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` so log text lives in one place instead of
//! being scattered through the code as format strings.
//!
//! # Organization
//!
//! * `bridge` - Host function registration and failures
//! * `instance` - Instance creation, calls and release
//! * `pool` - Signing pool batches and watchdog events
//! * `registry` - Module loading and artifact compilation
//!
//! # Usage Pattern
//!
//! ```rust
//! use sigbox::observability::messages::registry::ArtifactReused;
//!
//! let msg = ArtifactReused {
//!     name: "signer",
//!     fingerprint: "3f2a9c01",
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

pub mod bridge;
pub mod instance;
pub mod pool;
pub mod registry;
