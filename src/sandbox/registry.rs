// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiled module registry.
//!
//! Turns bytecode + manifest into a `CompiledArtifact`. Validation happens in this
//! order, and the first failure wins:
//!
//! 1. manifest consistency, size and encoding (core module only)
//! 2. wasmtime compilation
//! 3. manifest host imports resolve against the host function table
//! 4. every module import is declared in the manifest, lives in `sigbox:host`, and
//!    has the signature the host function expects
//! 5. linking and pre-instantiation
//!
//! Artifacts are cached by `sha256(bytecode || manifest)`, so the same pair is
//! compiled once and every later `compile` returns the same `Arc`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use wasmtime::{Engine, ExternType, FuncType, Linker, Module, ValType};

use super::artifact::CompiledArtifact;
use super::detector::ensure_core_module;
use super::engine::create_engine;
use super::instance::InstanceState;
use super::loader::{check_size, load_wasm_bytes};
use super::manifest::ModuleManifest;
use crate::bridge::{HostFunctionTable, HOST_NAMESPACE};
use crate::errors::{CompilationError, SigboxResult};
use crate::observability::messages::registry::{
    ArtifactCompiled, ArtifactReused, CompilationFailed,
};

/// Compiles and caches guest modules against one engine and host function table.
pub struct ModuleRegistry {
    engine: Engine,
    host_functions: HostFunctionTable,
    cache: Mutex<HashMap<String, Arc<CompiledArtifact>>>,
}

impl ModuleRegistry {
    /// Registry offering the default host functions (`hmac256`).
    pub fn new() -> SigboxResult<Self> {
        Self::with_host_functions(HostFunctionTable::with_defaults())
    }

    pub fn with_host_functions(host_functions: HostFunctionTable) -> SigboxResult<Self> {
        Ok(Self {
            engine: create_engine()?,
            host_functions,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn host_functions(&self) -> &HostFunctionTable {
        &self.host_functions
    }

    /// Number of distinct artifacts compiled so far.
    pub fn cached(&self) -> usize {
        self.lock_cache().len()
    }

    /// Loads a manifest and the WASM file it names, then compiles them.
    pub fn compile_file(&self, manifest_path: &Path) -> SigboxResult<Arc<CompiledArtifact>> {
        let manifest = ModuleManifest::from_file(manifest_path)?;
        let dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        let bytecode = load_wasm_bytes(manifest.wasm_path(dir))?;
        self.compile(&bytecode, &manifest)
    }

    /// Compiles `bytecode` under `manifest`, or returns the cached artifact for the pair.
    pub fn compile(
        &self,
        bytecode: &[u8],
        manifest: &ModuleManifest,
    ) -> SigboxResult<Arc<CompiledArtifact>> {
        let fingerprint = fingerprint(bytecode, manifest);

        // Held across compilation so a pair is never compiled twice.
        let mut cache = self.lock_cache();
        if let Some(artifact) = cache.get(&fingerprint) {
            tracing::debug!(
                "{}",
                ArtifactReused {
                    name: artifact.name(),
                    fingerprint: &fingerprint,
                }
            );
            return Ok(Arc::clone(artifact));
        }

        let artifact = self
            .build(bytecode, manifest, fingerprint.clone())
            .map_err(|error| {
                tracing::error!(
                    "{}",
                    CompilationFailed {
                        name: &manifest.name,
                        error: &error,
                    }
                );
                error
            })?;
        let artifact = Arc::new(artifact);

        tracing::info!(
            "{}",
            ArtifactCompiled {
                name: artifact.name(),
                fingerprint: &fingerprint,
                host_imports: manifest.host_imports.len(),
                exports: manifest.exports.len(),
            }
        );
        cache.insert(fingerprint, Arc::clone(&artifact));
        Ok(artifact)
    }

    fn build(
        &self,
        bytecode: &[u8],
        manifest: &ModuleManifest,
        fingerprint: String,
    ) -> SigboxResult<CompiledArtifact> {
        manifest
            .validate()
            .map_err(|e| CompilationError::InvalidManifest(e.to_string()))?;
        check_size(bytecode)?;
        ensure_core_module(bytecode)?;

        let module = Module::new(&self.engine, bytecode)
            .map_err(|e| CompilationError::InvalidBytecode(e.to_string()))?;

        for name in &manifest.host_imports {
            if !self.host_functions.contains(name) {
                return Err(CompilationError::UnresolvedImport(name.clone()).into());
            }
        }
        self.check_imports(&module, manifest)?;

        let mut linker: Linker<InstanceState> = Linker::new(&self.engine);
        self.host_functions
            .define_in(&mut linker, &self.engine, &manifest.host_imports)?;
        let pre = linker
            .instantiate_pre(&module)
            .map_err(|e| CompilationError::Link(e.to_string()))?;

        Ok(CompiledArtifact::new(
            fingerprint,
            manifest.clone(),
            self.engine.clone(),
            pre,
        ))
    }

    fn check_imports(
        &self,
        module: &Module,
        manifest: &ModuleManifest,
    ) -> Result<(), CompilationError> {
        for import in module.imports() {
            let (namespace, name) = (import.module(), import.name());
            if namespace != HOST_NAMESPACE || !manifest.declares_import(name) {
                return Err(CompilationError::UndeclaredImport {
                    module: namespace.to_string(),
                    name: name.to_string(),
                });
            }

            let descriptor = self
                .host_functions
                .get(name)
                .ok_or_else(|| CompilationError::UnresolvedImport(name.to_string()))?;
            let expected = descriptor.func_type(&self.engine);
            match import.ty() {
                ExternType::Func(found) if found.matches(&expected) => {}
                ExternType::Func(found) => {
                    return Err(CompilationError::SignatureMismatch {
                        name: name.to_string(),
                        expected: render(&expected),
                        found: render(&found),
                    })
                }
                other => {
                    return Err(CompilationError::SignatureMismatch {
                        name: name.to_string(),
                        expected: render(&expected),
                        found: format!("{:?}", other),
                    })
                }
            }
        }
        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<CompiledArtifact>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("host_functions", &self.host_functions.names().collect::<Vec<_>>())
            .field("cached", &self.cached())
            .finish()
    }
}

fn fingerprint(bytecode: &[u8], manifest: &ModuleManifest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytecode);
    hasher.update(manifest.canonical_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn render(ty: &FuncType) -> String {
    format!("({}) -> ({})", join(ty.params()), join(ty.results()))
}

fn join(types: impl Iterator<Item = ValType>) -> String {
    types.map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SigboxError;

    fn registry() -> ModuleRegistry {
        ModuleRegistry::new().unwrap()
    }

    #[test]
    fn test_fingerprint_depends_on_manifest() {
        let a = ModuleManifest::new("a").with_export("add");
        let b = ModuleManifest::new("a").with_export("sign");
        assert_ne!(fingerprint(b"\0asm", &a), fingerprint(b"\0asm", &b));
        assert_eq!(fingerprint(b"\0asm", &a), fingerprint(b"\0asm", &a));
        assert_eq!(fingerprint(b"\0asm", &a).len(), 64);
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let result = registry().compile(&[], &ModuleManifest::new("empty"));
        assert!(matches!(
            result,
            Err(SigboxError::Compilation(CompilationError::InvalidBytecode(_)))
        ));
    }

    #[test]
    fn test_unresolved_manifest_import() {
        let wasm = wat::parse_str("(module)").unwrap();
        let manifest = ModuleManifest::new("x").with_host_import("read_file");
        match registry().compile(&wasm, &manifest) {
            Err(SigboxError::Compilation(CompilationError::UnresolvedImport(name))) => {
                assert_eq!(name, "read_file")
            }
            other => panic!("expected UnresolvedImport, got {:?}", other),
        }
    }

    #[test]
    fn test_import_from_foreign_namespace() {
        let wasm = wat::parse_str(
            r#"(module (import "wasi_snapshot_preview1" "fd_write" (func (param i32 i32 i32 i32) (result i32))))"#,
        )
        .unwrap();
        match registry().compile(&wasm, &ModuleManifest::new("x")) {
            Err(SigboxError::Compilation(CompilationError::UndeclaredImport { module, name })) => {
                assert_eq!(module, "wasi_snapshot_preview1");
                assert_eq!(name, "fd_write");
            }
            other => panic!("expected UndeclaredImport, got {:?}", other),
        }
    }

    #[test]
    fn test_signature_mismatch() {
        let wasm = wat::parse_str(
            r#"(module (import "sigbox:host" "hmac256" (func (param i32 i32) (result i32))))"#,
        )
        .unwrap();
        let manifest = ModuleManifest::new("x").with_host_import("hmac256");
        match registry().compile(&wasm, &manifest) {
            Err(SigboxError::Compilation(CompilationError::SignatureMismatch {
                name,
                expected,
                found,
            })) => {
                assert_eq!(name, "hmac256");
                assert_eq!(expected, "(i64, i64) -> (i64)");
                assert_eq!(found, "(i32, i32) -> (i32)");
            }
            other => panic!("expected SignatureMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_manifest_is_a_compilation_error() {
        let wasm = wat::parse_str("(module)").unwrap();
        let manifest = ModuleManifest::new("x").with_export("add").with_export("add");
        match registry().compile(&wasm, &manifest) {
            Err(SigboxError::Compilation(CompilationError::InvalidManifest(reason))) => {
                assert!(reason.contains("add"))
            }
            other => panic!("expected InvalidManifest, got {:?}", other),
        }
    }

    #[test]
    fn test_compile_is_cached() {
        let registry = registry();
        let wasm = wat::parse_str(r#"(module (import "sigbox:host" "hmac256" (func (param i64 i64) (result i64))))"#).unwrap();
        let manifest = ModuleManifest::new("x").with_host_import("hmac256");

        let first = registry.compile(&wasm, &manifest).unwrap();
        let second = registry.compile(&wasm, &manifest).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cached(), 1);
    }
}
