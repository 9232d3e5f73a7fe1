// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host function registration table.
//!
//! A `HostFunctionDescriptor` binds a name to its slot signature and a stateless
//! handler. Handlers are plain `fn` pointers: they cannot capture ambient state, and
//! everything they need arrives as explicit arguments (the caller's memory and the
//! stack slots).

use std::collections::BTreeMap;

use wasmtime::{Caller, Engine, FuncType, Linker, Val};

use super::memory::{CallerMemory, GuestMemory};
use super::{hmac256, Slot, SlotKind};
use crate::errors::{BridgeError, CompilationError, MemoryAccessError};
use crate::observability::messages::bridge::{HostFunctionFailed, HostFunctionRegistered};

/// Import module name under which host functions are linked.
pub const HOST_NAMESPACE: &str = "sigbox:host";

/// Stateless host function body.
pub type HostHandler = fn(&mut dyn GuestMemory, &[Slot]) -> Result<Vec<Slot>, BridgeError>;

/// Name, slot signature and handler of one host function.
#[derive(Debug, Clone)]
pub struct HostFunctionDescriptor {
    name: String,
    params: Vec<SlotKind>,
    results: Vec<SlotKind>,
    handler: HostHandler,
}

impl HostFunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        params: Vec<SlotKind>,
        results: Vec<SlotKind>,
        handler: HostHandler,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            results,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[SlotKind] {
        &self.params
    }

    pub fn results(&self) -> &[SlotKind] {
        &self.results
    }

    /// Wasm function type guests must import this function with.
    pub fn func_type(&self, engine: &Engine) -> FuncType {
        FuncType::new(
            engine,
            self.params.iter().map(|kind| kind.val_type()),
            self.results.iter().map(|kind| kind.val_type()),
        )
    }

    /// Runs the handler over raw stack values, checking arity and result kinds.
    pub fn invoke(
        &self,
        memory: &mut dyn GuestMemory,
        raw_params: &[u64],
    ) -> Result<Vec<u64>, BridgeError> {
        if raw_params.len() != self.params.len() {
            return Err(MemoryAccessError::ArityMismatch {
                name: self.name.clone(),
                expected: self.params.len(),
                found: raw_params.len(),
            }
            .into());
        }

        let slots: Vec<Slot> = self
            .params
            .iter()
            .zip(raw_params)
            .map(|(kind, raw)| Slot::from_raw(*kind, *raw))
            .collect();

        let results = (self.handler)(memory, &slots)?;

        if results.len() != self.results.len() {
            return Err(MemoryAccessError::ArityMismatch {
                name: self.name.clone(),
                expected: self.results.len(),
                found: results.len(),
            }
            .into());
        }
        for (index, (slot, kind)) in results.iter().zip(&self.results).enumerate() {
            if slot.kind() != *kind {
                return Err(MemoryAccessError::SlotKindMismatch {
                    index,
                    expected: *kind,
                }
                .into());
            }
        }

        Ok(results.into_iter().map(Slot::to_raw).collect())
    }

    /// Human-readable signature, e.g. `(memory-reference, memory-reference) -> (memory-reference)`.
    pub fn signature(&self) -> String {
        fn join(kinds: &[SlotKind]) -> String {
            kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
        format!("({}) -> ({})", join(&self.params), join(&self.results))
    }
}

/// Explicit name → descriptor table handed to the registry.
#[derive(Debug, Clone, Default)]
pub struct HostFunctionTable {
    functions: BTreeMap<String, HostFunctionDescriptor>,
}

impl HostFunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the keyed-digest primitive.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table
            .functions
            .insert(hmac256::HMAC256.to_string(), hmac256::descriptor());
        table
    }

    /// Adds a descriptor; names must be unique.
    pub fn register(&mut self, descriptor: HostFunctionDescriptor) -> Result<(), CompilationError> {
        if self.functions.contains_key(descriptor.name()) {
            return Err(CompilationError::DuplicateHostFunction(
                descriptor.name().to_string(),
            ));
        }
        tracing::debug!(
            "{}",
            HostFunctionRegistered {
                name: descriptor.name(),
                signature: &descriptor.signature(),
            }
        );
        self.functions
            .insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&HostFunctionDescriptor> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Defines the named host functions in `linker` under `HOST_NAMESPACE`.
    ///
    /// A failing handler returns its `BridgeError` from the wasmtime closure, which
    /// aborts the guest call; the instance recovers the typed error by downcasting.
    pub fn define_in<T: 'static>(
        &self,
        linker: &mut Linker<T>,
        engine: &Engine,
        names: &[String],
    ) -> Result<(), CompilationError> {
        for name in names {
            let descriptor = self
                .get(name)
                .ok_or_else(|| CompilationError::UnresolvedImport(name.clone()))?
                .clone();
            let ty = descriptor.func_type(engine);

            linker
                .func_new(
                    HOST_NAMESPACE,
                    name,
                    ty,
                    move |mut caller: Caller<'_, T>, params: &[Val], results: &mut [Val]| {
                        let raw: Vec<u64> = params
                            .iter()
                            .map(|value| value.i64().unwrap_or_default() as u64)
                            .collect();
                        let mut memory = CallerMemory::new(&mut caller);
                        let outputs = descriptor.invoke(&mut memory, &raw).map_err(|error| {
                            tracing::warn!(
                                "{}",
                                HostFunctionFailed {
                                    name: descriptor.name(),
                                    error: &error,
                                }
                            );
                            wasmtime::Error::new(error)
                        })?;
                        for (slot, value) in results.iter_mut().zip(outputs) {
                            *slot = Val::I64(value as i64);
                        }
                        Ok(())
                    },
                )
                .map_err(|e| CompilationError::Link(e.to_string()))?;
        }
        Ok(())
    }
}
