// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for the module registry and the instance lifecycle.

use std::time::Duration;
use thiserror::Error;

/// Error message for unsupported Component Model binaries.
///
/// Signing plugins are classic core modules with a C-style export table; components
/// and legacy Preview 1 components are rejected at compile time.
pub const WASM_UNSUPPORTED_ENCODING: &str = "Unsupported WASM binary: signing plugins must be \
core WebAssembly modules (binary version 1) without a component section.";

/// Failure to turn bytecode + manifest into a `CompiledArtifact`.
///
/// Fatal to that module version; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilationError {
    /// Invalid or malformed WASM binary.
    #[error("Invalid WASM binary: {0}")]
    InvalidBytecode(String),

    /// Valid WASM, but not an encoding this host runs.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The manifest compiled against is inconsistent (empty name, duplicates, ABI names).
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Binary larger than the registry accepts.
    #[error("WASM module too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// The manifest names a host import that no descriptor provides.
    #[error("Host import '{0}' declared in manifest has no registered host function")]
    UnresolvedImport(String),

    /// The module imports something the manifest did not declare.
    #[error("Module imports '{module}::{name}' which is not declared in its manifest")]
    UndeclaredImport { module: String, name: String },

    /// The module's import type disagrees with the descriptor's slot kinds.
    #[error("Host import '{name}' has signature {found}, host function expects {expected}")]
    SignatureMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// Two descriptors registered under the same name.
    #[error("Host function '{0}' is already registered")]
    DuplicateHostFunction(String),

    /// Wasmtime engine creation or configuration error.
    #[error("Engine creation error: {0}")]
    Engine(String),

    /// Linking host functions or pre-instantiating failed.
    #[error("Link error: {0}")]
    Link(String),
}

/// Failure to create an `Instance` from an artifact.
///
/// Fatal to that call attempt; the caller may retry with backoff.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstantiationError {
    /// The store's resource limiter refused the module's memory or tables.
    #[error("Resource exhausted while instantiating: {0}")]
    ResourceExhausted(String),

    /// A required ABI or manifest export is missing or has the wrong type.
    #[error("Required export '{name}' unavailable: {reason}")]
    MissingExport { name: String, reason: String },

    /// Store setup or instantiation failed for another reason (e.g. start trap).
    #[error("Instantiation failed: {0}")]
    Failed(String),
}

/// Failure while a guest export runs or while its output is collected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The guest trapped.
    #[error("Guest trap in '{export}': {message}")]
    Trap { export: String, message: String },

    /// The fuel budget ran out before the export returned.
    #[error("Guest export '{export}' exhausted its fuel budget")]
    FuelExhausted { export: String },

    /// The guest tried to grow memory beyond the store limit.
    #[error("Guest export '{export}' exceeded the instance memory limit")]
    MemoryLimitExceeded { export: String },

    /// The guest returned a non-zero status with an error message.
    #[error("Guest export '{export}' failed with status {status}: {message}")]
    GuestFailure {
        export: String,
        status: i32,
        message: String,
    },

    /// The output channel could not be read.
    #[error("Unable to retrieve output: {0}")]
    OutputUnavailable(String),

    /// The guest allocator could not provide the request buffer.
    #[error("Guest allocator failed for {0} bytes")]
    AllocationFailed(usize),

    /// No callable export with this name.
    #[error("Guest export '{0}' not found")]
    UnknownExport(String),

    /// The instance already served its call or was released.
    #[error("Instance has been released; create a new instance per call")]
    InstanceReleased,

    /// The call was interrupted through its `InterruptHandle`.
    #[error("Guest export '{export}' was interrupted")]
    Interrupted { export: String },

    /// The external watchdog gave up on the call.
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    /// The worker running the call panicked or was cancelled.
    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}
