// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-call guest instances.
//!
//! An `Instance` owns one wasmtime `Store`, so its linear memory is never visible to
//! another instance. It serves exactly one call: `call` consumes the live store and
//! drops it on every exit path, and `release`/`Drop` cover instances never called.
//!
//! Every store has an epoch deadline one tick ahead. When an `InterruptHandle`
//! fires it bumps the engine epoch; each running store then checks its own flag and
//! either traps or extends its deadline by a tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use wasmtime::{Engine, Memory, ResourceLimiter, Store, Trap, TypedFunc, UpdateDeadline};

use super::artifact::CompiledArtifact;
use crate::bridge::memory::{ALLOCATE_EXPORT, MEMORY_EXPORT};
use crate::bridge::{check_bounds, MemoryHandle};
use crate::config::consts::{DEFAULT_FUEL_LEVEL, DEFAULT_MAX_MEMORY_BYTES, MAX_TABLE_ELEMENTS};
use crate::errors::{
    BridgeError, ExecutionError, InstantiationError, SigboxError, SigboxResult,
};
use crate::observability::messages::instance::{
    CallCompleted, CallFailed, InstanceCreated, InstanceReleased, InstantiationFailed,
};
use crate::protocol::{interpret_status, STATUS_MALFORMED_REQUEST, STATUS_OK};

const DEALLOCATE_EXPORT: &str = "deallocate";
const OUTPUT_PTR_EXPORT: &str = "output_ptr";
const OUTPUT_LEN_EXPORT: &str = "output_len";

/// Resource budget applied to each instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Fuel units available to the whole instance (instantiation + one call).
    pub fuel: u64,
    /// Upper bound on linear memory, in bytes.
    pub max_memory_bytes: usize,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            fuel: DEFAULT_FUEL_LEVEL,
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
        }
    }
}

/// Stops a running call from another thread.
///
/// One handle per call. Interrupting a handle whose call has not started yet makes
/// that call fail as soon as it begins; interrupting after it finished does nothing.
#[derive(Clone)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
    engine: Engine,
}

impl InterruptHandle {
    pub(crate) fn new(engine: Engine) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            engine,
        }
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.engine.increment_epoch();
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Store data; doubles as the store's resource limiter.
pub(crate) struct InstanceState {
    max_memory_bytes: usize,
    memory_denied: bool,
    interrupt: Arc<AtomicBool>,
}

impl InstanceState {
    fn new(max_memory_bytes: usize, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            max_memory_bytes,
            memory_denied: false,
            interrupt,
        }
    }

    fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }
}

impl ResourceLimiter for InstanceState {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        let allowed = desired <= self.max_memory_bytes;
        if !allowed {
            self.memory_denied = true;
        }
        Ok(allowed)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(desired <= MAX_TABLE_ELEMENTS)
    }
}

/// A single-use instance of a compiled artifact.
pub struct Instance {
    artifact: Arc<CompiledArtifact>,
    live: Option<LiveInstance>,
}

struct LiveInstance {
    store: Store<InstanceState>,
    memory: Memory,
    allocate: TypedFunc<i32, i32>,
    deallocate: TypedFunc<(i32, i32), ()>,
    output_ptr: TypedFunc<(), i32>,
    output_len: TypedFunc<(), i32>,
    operations: HashMap<String, TypedFunc<(i32, i32), i32>>,
}

impl Instance {
    /// Instantiates `artifact` in a fresh store bounded by `config`.
    ///
    /// # Errors
    /// * `InstantiationError::ResourceExhausted` - the module's memory exceeds the limit
    /// * `InstantiationError::MissingExport` - an ABI or manifest export is absent or mistyped
    /// * `InstantiationError::Failed` - any other instantiation failure
    pub fn new(artifact: &Arc<CompiledArtifact>, config: &InstanceConfig) -> SigboxResult<Self> {
        Self::interruptible(artifact, config, &artifact.interrupt_handle())
    }

    /// Like `new`, but the call can be stopped through `interrupt`.
    pub fn interruptible(
        artifact: &Arc<CompiledArtifact>,
        config: &InstanceConfig,
        interrupt: &InterruptHandle,
    ) -> SigboxResult<Self> {
        match LiveInstance::create(artifact, config, interrupt) {
            Ok(live) => {
                tracing::debug!(
                    "{}",
                    InstanceCreated {
                        artifact: artifact.name(),
                        fuel: config.fuel,
                        max_memory_bytes: config.max_memory_bytes,
                    }
                );
                Ok(Self {
                    artifact: Arc::clone(artifact),
                    live: Some(live),
                })
            }
            Err(error) => {
                tracing::warn!(
                    "{}",
                    InstantiationFailed {
                        artifact: artifact.name(),
                        error: &error,
                    }
                );
                Err(error.into())
            }
        }
    }

    pub fn artifact(&self) -> &Arc<CompiledArtifact> {
        &self.artifact
    }

    /// Calls operation `export` with `request` and returns the guest's response bytes.
    ///
    /// The instance is released when this returns, whatever the outcome. Calling it
    /// again fails with `ExecutionError::InstanceReleased`.
    pub fn call(&mut self, export: &str, request: &[u8]) -> SigboxResult<Vec<u8>> {
        let mut live = self.live.take().ok_or(ExecutionError::InstanceReleased)?;
        let started = Instant::now();

        let result = live.call(export, request);
        self.finish(live);

        match &result {
            Ok(output) => tracing::debug!(
                "{}",
                CallCompleted {
                    artifact: self.artifact.name(),
                    export,
                    input_size: request.len(),
                    output_size: output.len(),
                    duration: started.elapsed(),
                }
            ),
            Err(error) => tracing::warn!(
                "{}",
                CallFailed {
                    artifact: self.artifact.name(),
                    export,
                    error,
                }
            ),
        }
        result
    }

    /// Drops the store and everything it owns. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(live) = self.live.take() {
            self.finish(live);
        }
    }

    pub fn is_released(&self) -> bool {
        self.live.is_none()
    }

    fn finish(&self, live: LiveInstance) {
        drop(live);
        tracing::trace!(
            "{}",
            InstanceReleased {
                artifact: self.artifact.name(),
            }
        );
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("artifact", &self.artifact.name())
            .field("released", &self.is_released())
            .finish()
    }
}

fn missing(name: &str, reason: impl std::fmt::Display) -> InstantiationError {
    InstantiationError::MissingExport {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl LiveInstance {
    fn create(
        artifact: &CompiledArtifact,
        config: &InstanceConfig,
        interrupt: &InterruptHandle,
    ) -> Result<Self, InstantiationError> {
        let state = InstanceState::new(config.max_memory_bytes, Arc::clone(&interrupt.flag));
        let mut store = Store::new(artifact.engine(), state);
        store.limiter(|state| state);
        store.epoch_deadline_callback(|context| {
            if context.data().interrupted() {
                return Err(wasmtime::Error::new(Trap::Interrupt));
            }
            Ok(UpdateDeadline::Continue(1))
        });
        store.set_epoch_deadline(1);
        store
            .set_fuel(config.fuel)
            .map_err(|e| InstantiationError::Failed(e.to_string()))?;

        let instance = match artifact.pre().instantiate(&mut store) {
            Ok(instance) => instance,
            Err(e) if store.data().memory_denied => {
                return Err(InstantiationError::ResourceExhausted(format!(
                    "linear memory exceeds limit of {} bytes: {}",
                    config.max_memory_bytes, e
                )))
            }
            Err(e) => return Err(InstantiationError::Failed(e.to_string())),
        };

        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| missing(MEMORY_EXPORT, "module must export its linear memory"))?;
        let allocate = instance
            .get_typed_func::<i32, i32>(&mut store, ALLOCATE_EXPORT)
            .map_err(|e| missing(ALLOCATE_EXPORT, e))?;
        let deallocate = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, DEALLOCATE_EXPORT)
            .map_err(|e| missing(DEALLOCATE_EXPORT, e))?;
        let output_ptr = instance
            .get_typed_func::<(), i32>(&mut store, OUTPUT_PTR_EXPORT)
            .map_err(|e| missing(OUTPUT_PTR_EXPORT, e))?;
        let output_len = instance
            .get_typed_func::<(), i32>(&mut store, OUTPUT_LEN_EXPORT)
            .map_err(|e| missing(OUTPUT_LEN_EXPORT, e))?;

        let mut operations = HashMap::new();
        for name in &artifact.manifest().exports {
            let func = instance
                .get_typed_func::<(i32, i32), i32>(&mut store, name)
                .map_err(|e| missing(name, e))?;
            operations.insert(name.clone(), func);
        }

        Ok(Self {
            store,
            memory,
            allocate,
            deallocate,
            output_ptr,
            output_len,
            operations,
        })
    }

    fn call(&mut self, export: &str, request: &[u8]) -> SigboxResult<Vec<u8>> {
        // The deadline is armed by now, so a later interrupt is caught by the callback.
        if self.store.data().interrupted() {
            return Err(ExecutionError::Interrupted {
                export: export.to_string(),
            }
            .into());
        }
        let func = self
            .operations
            .get(export)
            .cloned()
            .ok_or_else(|| ExecutionError::UnknownExport(export.to_string()))?;

        let (ptr, len) = self.write_request(export, request)?;
        let status = func
            .call(&mut self.store, (ptr, len))
            .map_err(|e| self.classify(export, e))?;

        let output = self.read_output(export);
        if len > 0 {
            self.deallocate
                .call(&mut self.store, (ptr, len))
                .map_err(|e| self.classify(export, e))?;
        }
        let output = output?;

        // A malformed-request verdict stands even if the guest also hit the limit.
        let failed = status != STATUS_OK && status != STATUS_MALFORMED_REQUEST;
        if failed && self.store.data().memory_denied {
            return Err(ExecutionError::MemoryLimitExceeded {
                export: export.to_string(),
            }
            .into());
        }
        interpret_status(export, status, output)
    }

    fn write_request(&mut self, export: &str, request: &[u8]) -> SigboxResult<(i32, i32)> {
        if request.is_empty() {
            return Ok((0, 0));
        }
        let len = i32::try_from(request.len())
            .map_err(|_| ExecutionError::AllocationFailed(request.len()))?;
        let ptr = self
            .allocate
            .call(&mut self.store, len)
            .map_err(|e| self.classify(export, e))?;
        if ptr <= 0 {
            if self.store.data().memory_denied {
                return Err(ExecutionError::MemoryLimitExceeded {
                    export: export.to_string(),
                }
                .into());
            }
            return Err(ExecutionError::AllocationFailed(request.len()).into());
        }

        let handle = MemoryHandle::new(ptr as u32, len as u32);
        let range = check_bounds(handle, self.memory.data_size(&self.store))?;
        self.memory.data_mut(&mut self.store)[range].copy_from_slice(request);
        Ok((ptr, len))
    }

    fn read_output(&mut self, export: &str) -> SigboxResult<Vec<u8>> {
        let ptr = self
            .output_ptr
            .call(&mut self.store, ())
            .map_err(|e| self.classify(export, e))?;
        let len = self
            .output_len
            .call(&mut self.store, ())
            .map_err(|e| self.classify(export, e))?;
        if ptr < 0 || len < 0 {
            return Err(ExecutionError::OutputUnavailable(format!(
                "'{}' reported output at {} with length {}",
                export, ptr, len
            ))
            .into());
        }

        let handle = MemoryHandle::new(ptr as u32, len as u32);
        let range = check_bounds(handle, self.memory.data_size(&self.store))
            .map_err(|e| ExecutionError::OutputUnavailable(e.to_string()))?;
        Ok(self.memory.data(&self.store)[range].to_vec())
    }

    /// Maps a wasmtime call failure onto the host error taxonomy.
    fn classify(&self, export: &str, error: wasmtime::Error) -> SigboxError {
        let error = match error.downcast::<BridgeError>() {
            Ok(bridge) => return bridge.into(),
            Err(error) => error,
        };
        match error.downcast_ref::<Trap>() {
            Some(Trap::OutOfFuel) => {
                return ExecutionError::FuelExhausted {
                    export: export.to_string(),
                }
                .into()
            }
            Some(Trap::Interrupt) => {
                return ExecutionError::Interrupted {
                    export: export.to_string(),
                }
                .into()
            }
            _ => {}
        }
        if self.store.data().memory_denied {
            return ExecutionError::MemoryLimitExceeded {
                export: export.to_string(),
            }
            .into();
        }
        ExecutionError::Trap {
            export: export.to_string(),
            message: error.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_fuel_and_memory_defaults() {
        let config = InstanceConfig::default();
        assert_eq!(config.fuel, 100_000_000);
        assert_eq!(config.max_memory_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_limiter_denies_growth_past_limit() {
        let mut state = InstanceState::new(65536, Arc::default());
        assert!(state.memory_growing(0, 65536, None).unwrap());
        assert!(!state.memory_denied);
        assert!(!state.memory_growing(65536, 131072, None).unwrap());
        assert!(state.memory_denied);
    }

    #[test]
    fn test_interrupt_handle_clones_share_flag() {
        let handle = InterruptHandle::new(crate::sandbox::engine::create_engine().unwrap());
        let watchdog = handle.clone();
        assert!(!handle.is_interrupted());
        watchdog.interrupt();
        assert!(handle.is_interrupted());

        let state = InstanceState::new(65536, Arc::clone(&handle.flag));
        assert!(state.interrupted());
    }

    #[test]
    fn test_limiter_bounds_tables() {
        let mut state = InstanceState::new(65536, Arc::default());
        assert!(state.table_growing(0, 10, None).unwrap());
        assert!(!state.table_growing(0, MAX_TABLE_ELEMENTS + 1, None).unwrap());
    }
}
