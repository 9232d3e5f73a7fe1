// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the signing pool.

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// A batch of signing calls was submitted.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use sigbox::observability::messages::pool::BatchStarted;
///
/// let msg = BatchStarted {
///     signer: "authorization_issuer",
///     requests: 16,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BatchStarted<'a> {
    pub signer: &'a str,
    pub requests: usize,
    pub max_concurrency: usize,
}

impl Display for BatchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} '{}' calls with max_concurrency={}",
            self.requests, self.signer, self.max_concurrency
        )
    }
}

/// Every call in a batch finished, failed, or timed out.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BatchCompleted {
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl Display for BatchCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Batch completed in {:?}: {} succeeded, {} failed",
            self.elapsed, self.succeeded, self.failed
        )
    }
}

/// The watchdog gave up on a call and interrupted it.
///
/// # Log Level
/// `warn!` - The guest traps at its next epoch check and its instance is released
pub struct CallTimedOut {
    pub index: usize,
    pub timeout: Duration,
}

impl Display for CallTimedOut {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call #{} exceeded {:?}; interrupting it",
            self.index, self.timeout
        )
    }
}
