// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for module loading and compilation events.
//!
//! This module contains message types for logging events related to:
//! * WASM module loading and validation
//! * Manifest resolution against the host function table
//! * Compiled artifact creation and cache reuse

use std::fmt::{Display, Formatter};

/// WASM module loaded successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use sigbox::observability::messages::registry::ModuleLoaded;
///
/// let msg = ModuleLoaded {
///     module_path: "wasm_plugins/signer.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModuleLoaded<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for ModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded WASM module: {} ({} bytes)",
            self.module_path, self.size_bytes
        )
    }
}

/// WASM module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use sigbox::observability::messages::registry::ModuleLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ModuleLoadFailed {
///     module_path: "wasm_plugins/missing.wasm",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModuleLoadFailed<'a> {
    pub module_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load WASM module '{}': {}",
            self.module_path, self.error
        )
    }
}

/// A module was compiled into a new artifact.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ArtifactCompiled<'a> {
    pub name: &'a str,
    pub fingerprint: &'a str,
    pub host_imports: usize,
    pub exports: usize,
}

impl Display for ArtifactCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled artifact '{}' [{}]: host_imports={}, exports={}",
            self.name, self.fingerprint, self.host_imports, self.exports
        )
    }
}

/// An identical (bytecode, manifest) pair was compiled before; the artifact is reused.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ArtifactReused<'a> {
    pub name: &'a str,
    pub fingerprint: &'a str,
}

impl Display for ArtifactReused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reusing compiled artifact '{}' [{}]",
            self.name, self.fingerprint
        )
    }
}

/// Compilation of a module failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CompilationFailed<'a> {
    pub name: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CompilationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to compile module '{}': {}", self.name, self.error)
    }
}
