// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use wasmtime::{Engine, InstancePre};

use super::instance::{Instance, InstanceConfig, InstanceState, InterruptHandle};
use super::manifest::ModuleManifest;
use crate::errors::SigboxResult;

/// A validated, compiled and pre-linked guest module.
///
/// Immutable once built. Share it through `Arc`; every instance holds a clone, so the
/// artifact outlives all instances created from it.
pub struct CompiledArtifact {
    fingerprint: String,
    manifest: ModuleManifest,
    engine: Engine,
    pre: InstancePre<InstanceState>,
}

impl CompiledArtifact {
    pub(crate) fn new(
        fingerprint: String,
        manifest: ModuleManifest,
        engine: Engine,
        pre: InstancePre<InstanceState>,
    ) -> Self {
        Self {
            fingerprint,
            manifest,
            engine,
            pre,
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Hex SHA-256 of the bytecode and manifest this artifact was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn manifest(&self) -> &ModuleManifest {
        &self.manifest
    }

    pub fn exports(&self) -> &[String] {
        &self.manifest.exports
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    pub(crate) fn pre(&self) -> &InstancePre<InstanceState> {
        &self.pre
    }

    /// Creates a fresh single-use instance.
    pub fn instantiate(self: &Arc<Self>, config: &InstanceConfig) -> SigboxResult<Instance> {
        Instance::new(self, config)
    }

    /// A new handle for stopping one call made through `run_interruptible`.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle::new(self.engine.clone())
    }

    /// Instantiates, calls `export` once and releases the instance.
    pub fn run(
        self: &Arc<Self>,
        config: &InstanceConfig,
        export: &str,
        request: &[u8],
    ) -> SigboxResult<Vec<u8>> {
        self.run_interruptible(config, export, request, &self.interrupt_handle())
    }

    /// `run`, stoppable from another thread through `interrupt`.
    ///
    /// An interrupted call fails with `ExecutionError::Interrupted` and its instance is
    /// released before this returns.
    pub fn run_interruptible(
        self: &Arc<Self>,
        config: &InstanceConfig,
        export: &str,
        request: &[u8],
        interrupt: &InterruptHandle,
    ) -> SigboxResult<Vec<u8>> {
        let mut instance = Instance::interruptible(self, config, interrupt)?;
        instance.call(export, request)
    }
}

impl std::fmt::Debug for CompiledArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledArtifact")
            .field("name", &self.manifest.name)
            .field("fingerprint", &self.fingerprint)
            .field("exports", &self.manifest.exports)
            .finish()
    }
}
