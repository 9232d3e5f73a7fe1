// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sandbox runtime: module registry and instance lifecycle.
//!
//! # Pipeline
//!
//! ```text
//! manifest + .wasm
//!       ↓
//! ModuleRegistry::compile ── size, encoding, imports, signatures
//!       ↓
//! Arc<CompiledArtifact> ──── shared, immutable, pre-linked with host functions
//!       ↓
//! Instance (one Store each) ── exactly one call, then released
//! ```
//!
//! # Security
//!
//! * Guest modules are core WebAssembly only; components are rejected.
//! * The only imports a guest may have are host functions from `sigbox:host` that
//!   its manifest declares. No WASI is linked.
//! * Every instance runs under a fuel budget and a linear memory limit.

mod artifact;
pub mod detector;
pub mod engine;
mod instance;
pub mod loader;
pub mod manifest;
mod registry;

pub use artifact::CompiledArtifact;
pub use instance::{Instance, InstanceConfig, InterruptHandle};
pub use manifest::ModuleManifest;
pub use registry::ModuleRegistry;
