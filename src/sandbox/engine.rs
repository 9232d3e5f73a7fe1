// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime engine configuration.
//!
//! One engine is shared by the registry and every artifact and instance it produces.
//! Engines are thread-safe and cheap to clone.

use crate::errors::CompilationError;
use wasmtime::*;

/// Creates the Wasmtime engine used for signing plugins.
///
/// The engine is configured with security-focused defaults:
/// - `consume_fuel(true)` - Every instance runs under a fuel budget
/// - `epoch_interruption(true)` - Calls can be interrupted through an `InterruptHandle`
/// - `wasm_component_model(false)` - Plugins are core modules only
/// - Disabled features: threads, SIMD, multi-memory, memory64
///
/// # Returns
/// * `Ok(Engine)` - Configured Wasmtime engine
/// * `Err(CompilationError::Engine)` - If engine creation fails
pub fn create_engine() -> Result<Engine, CompilationError> {
    let mut config = Config::new();

    config.wasm_component_model(false);

    // Security and sandboxing configuration
    config.wasm_threads(false); // No shared memory between instances
    config.wasm_simd(false); // No SIMD instructions
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false); // Single memory instance only
    config.wasm_memory64(false); // 32-bit memory addressing only
    config.consume_fuel(true); // Enable fuel for execution limits
    config.epoch_interruption(true); // Watchdog interrupts, checked per store

    tracing::debug!("Creating engine for signing plugins");
    Engine::new(&config).map_err(|e| CompilationError::Engine(e.to_string()))
}
