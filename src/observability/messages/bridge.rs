// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the host capability bridge.

use std::fmt::{Display, Formatter};

/// Host function added to a table.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use sigbox::observability::messages::bridge::HostFunctionRegistered;
///
/// let msg = HostFunctionRegistered {
///     name: "hmac256",
///     signature: "(memory-reference, memory-reference) -> (memory-reference)",
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct HostFunctionRegistered<'a> {
    pub name: &'a str,
    pub signature: &'a str,
}

impl Display for HostFunctionRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered host function '{}' {}",
            self.name, self.signature
        )
    }
}

/// Host function aborted the guest call.
///
/// # Log Level
/// `warn!` - The call fails; sibling instances are unaffected
pub struct HostFunctionFailed<'a> {
    pub name: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for HostFunctionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Host function '{}' aborted the guest call: {}",
            self.name, self.error
        )
    }
}
