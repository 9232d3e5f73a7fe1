// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for instance lifecycle events.
//!
//! Request and response payloads are never part of these messages: they may carry
//! secret keys or signed tokens.

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Instance created from an artifact.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use sigbox::observability::messages::instance::InstanceCreated;
///
/// let msg = InstanceCreated {
///     artifact: "signer",
///     fuel: 100_000_000,
///     max_memory_bytes: 16 * 1024 * 1024,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct InstanceCreated<'a> {
    pub artifact: &'a str,
    pub fuel: u64,
    pub max_memory_bytes: usize,
}

impl Display for InstanceCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created instance of '{}' with fuel={} max_memory={} bytes",
            self.artifact, self.fuel, self.max_memory_bytes
        )
    }
}

/// Instantiation failed.
///
/// # Log Level
/// `warn!` - The call attempt fails; the caller may retry with a new instance
///
/// # Example
/// ```rust
/// use sigbox::observability::messages::instance::InstantiationFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "memory limit");
/// let msg = InstantiationFailed {
///     artifact: "signer",
///     error: &error,
/// };
///
/// assert_eq!(msg.to_string(), "Failed to instantiate 'signer': memory limit");
/// tracing::warn!("{}", msg);
/// ```
pub struct InstantiationFailed<'a> {
    pub artifact: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for InstantiationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to instantiate '{}': {}",
            self.artifact, self.error
        )
    }
}

/// Guest export returned successfully.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use sigbox::observability::messages::instance::CallCompleted;
/// use std::time::Duration;
///
/// let msg = CallCompleted {
///     artifact: "signer",
///     export: "sign",
///     input_size: 210,
///     output_size: 240,
///     duration: Duration::from_millis(3),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct CallCompleted<'a> {
    pub artifact: &'a str,
    pub export: &'a str,
    pub input_size: usize,
    pub output_size: usize,
    pub duration: Duration,
}

impl Display for CallCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call '{}::{}' completed in {:?}: input={} bytes, output={} bytes",
            self.artifact, self.export, self.duration, self.input_size, self.output_size
        )
    }
}

/// Guest export failed.
///
/// # Log Level
/// `warn!` - The caller decides whether to retry
pub struct CallFailed<'a> {
    pub artifact: &'a str,
    pub export: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call '{}::{}' failed: {}",
            self.artifact, self.export, self.error
        )
    }
}

/// Instance memory and store released.
///
/// # Log Level
/// `trace!` - Emitted once per call
pub struct InstanceReleased<'a> {
    pub artifact: &'a str,
}

impl Display for InstanceReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Released instance of '{}'", self.artifact)
    }
}
