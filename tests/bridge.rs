// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod common;

use common::{fixture_artifact, FIXTURE_KEY};
use sigbox::bridge::hmac256::{keyed_digest, DIGEST_LEN};
use sigbox::bridge::{
    GuestMemory, HostFunctionDescriptor, HostFunctionTable, Slot, SlotKind,
};
use sigbox::errors::{
    BridgeError, CompilationError, CryptoBridgeError, MemoryAccessError, SigboxError,
};
use sigbox::sandbox::{InstanceConfig, ModuleManifest, ModuleRegistry};

#[test]
fn test_guest_digest_matches_host_primitive() {
    let artifact = fixture_artifact(&ModuleRegistry::new().unwrap());
    let message = br#"{"to_sign_string":"hello"}"#;

    let out = artifact
        .run(&InstanceConfig::default(), "digest", message)
        .unwrap();
    assert_eq!(out.len(), DIGEST_LEN);
    assert_eq!(out, keyed_digest(FIXTURE_KEY, message).unwrap());
}

#[test]
fn test_digest_is_deterministic_across_instances() {
    let artifact = fixture_artifact(&ModuleRegistry::new().unwrap());
    let config = InstanceConfig::default();
    let first = artifact.run(&config, "digest", b"same input").unwrap();
    let second = artifact.run(&config, "digest", b"same input").unwrap();
    let other = artifact.run(&config, "digest", b"other input").unwrap();
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_out_of_bounds_reference_aborts_call() {
    let artifact = fixture_artifact(&ModuleRegistry::new().unwrap());
    match artifact.run(&InstanceConfig::default(), "digest_oob", b"{}") {
        Err(SigboxError::CryptoBridge(CryptoBridgeError::UnreadableInput {
            input,
            source: MemoryAccessError::OutOfBounds { length, .. },
        })) => {
            assert_eq!(input, "key");
            assert_eq!(length, 64);
        }
        other => panic!("expected UnreadableInput, got {:?}", other),
    }
}

fn byte_len(_memory: &mut dyn GuestMemory, params: &[Slot]) -> Result<Vec<Slot>, BridgeError> {
    let handle = params[0].as_memory_ref(0)?;
    Ok(vec![Slot::Scalar(u64::from(handle.length))])
}

const BYTE_LEN_WAT: &str = r#"
(module
  (import "sigbox:host" "byte_len" (func $byte_len (param i64) (result i64)))
  (memory (export "memory") 1)
  (global $out (mut i32) (i32.const 0))
  (func (export "allocate") (param i32) (result i32) (i32.const 1024))
  (func (export "deallocate") (param i32 i32))
  (func (export "output_ptr") (result i32) (i32.const 0))
  (func (export "output_len") (result i32) (global.get $out))
  (func (export "measure") (param $ptr i32) (param $len i32) (result i32)
    (global.set $out
      (i32.wrap_i64
        (call $byte_len
          (i64.or
            (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
            (i64.extend_i32_u (local.get $len))))))
    (i32.const 0))
)
"#;

#[test]
fn test_custom_host_function() {
    let mut table = HostFunctionTable::new();
    table
        .register(HostFunctionDescriptor::new(
            "byte_len",
            vec![SlotKind::MemoryRef],
            vec![SlotKind::Scalar],
            byte_len,
        ))
        .unwrap();
    let registry = ModuleRegistry::with_host_functions(table).unwrap();

    let manifest = ModuleManifest::new("measure")
        .with_host_import("byte_len")
        .with_export("measure");
    let artifact = registry
        .compile(&wat::parse_str(BYTE_LEN_WAT).unwrap(), &manifest)
        .unwrap();

    // output_len reports what the host returned, so the output is the first N bytes
    // of memory.
    let out = artifact
        .run(&InstanceConfig::default(), "measure", b"seven!!")
        .unwrap();
    assert_eq!(out.len(), 7);
}

#[test]
fn test_host_import_without_registration() {
    let registry = ModuleRegistry::with_host_functions(HostFunctionTable::new()).unwrap();
    let manifest = ModuleManifest::new("measure")
        .with_host_import("byte_len")
        .with_export("measure");
    assert!(matches!(
        registry.compile(&wat::parse_str(BYTE_LEN_WAT).unwrap(), &manifest),
        Err(SigboxError::Compilation(CompilationError::UnresolvedImport(name))) if name == "byte_len"
    ));
}

#[test]
fn test_import_signature_checked() {
    let wasm = wat::parse_str(
        r#"(module
            (import "sigbox:host" "hmac256" (func (param i32 i32) (result i32)))
            (memory (export "memory") 1))"#,
    )
    .unwrap();
    let manifest = ModuleManifest::new("narrow").with_host_import("hmac256");
    match ModuleRegistry::new().unwrap().compile(&wasm, &manifest) {
        Err(SigboxError::Compilation(CompilationError::SignatureMismatch { name, .. })) => {
            assert_eq!(name, "hmac256")
        }
        other => panic!("expected SignatureMismatch, got {:?}", other),
    }
}

#[test]
fn test_duplicate_host_function() {
    let mut table = HostFunctionTable::with_defaults();
    let again = HostFunctionDescriptor::new(
        "hmac256",
        vec![SlotKind::MemoryRef],
        vec![SlotKind::Scalar],
        byte_len,
    );
    assert_eq!(
        table.register(again),
        Err(CompilationError::DuplicateHostFunction("hmac256".to_string()))
    );
    assert_eq!(table.len(), 1);
}
