// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fixture_artifact, fixture_manifest, fixture_wasm, FIXTURE_ERROR};
use sigbox::errors::{
    CompilationError, ExecutionError, InstantiationError, ProtocolError, SigboxError,
};
use sigbox::sandbox::{InstanceConfig, ModuleManifest, ModuleRegistry};

fn registry() -> ModuleRegistry {
    ModuleRegistry::new().unwrap()
}

#[test]
fn test_echo_round_trip() {
    let artifact = fixture_artifact(&registry());
    let mut instance = artifact.instantiate(&InstanceConfig::default()).unwrap();
    let out = instance.call("echo", br#"{"hello":"world"}"#).unwrap();
    assert_eq!(out, br#"{"hello":"world"}"#);
}

#[test]
fn test_empty_request() {
    let artifact = fixture_artifact(&registry());
    let out = artifact
        .run(&InstanceConfig::default(), "echo", b"")
        .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_instance_serves_one_call() {
    let artifact = fixture_artifact(&registry());
    let mut instance = artifact.instantiate(&InstanceConfig::default()).unwrap();
    assert!(!instance.is_released());

    instance.call("echo", b"1").unwrap();
    assert!(instance.is_released());

    match instance.call("echo", b"2") {
        Err(SigboxError::Execution(ExecutionError::InstanceReleased)) => {}
        other => panic!("expected InstanceReleased, got {:?}", other),
    }
}

#[test]
fn test_call_after_release() {
    let artifact = fixture_artifact(&registry());
    let mut instance = artifact.instantiate(&InstanceConfig::default()).unwrap();
    instance.release();
    instance.release();
    assert!(instance.is_released());
    assert!(matches!(
        instance.call("echo", b"x"),
        Err(SigboxError::Execution(ExecutionError::InstanceReleased))
    ));
}

#[test]
fn test_failed_call_still_releases() {
    let artifact = fixture_artifact(&registry());
    let mut instance = artifact.instantiate(&InstanceConfig::default()).unwrap();
    assert!(instance.call("trap", b"{}").is_err());
    assert!(instance.is_released());
}

#[test]
fn test_instance_holds_artifact_until_dropped() {
    let artifact = fixture_artifact(&registry());
    let instance = artifact.instantiate(&InstanceConfig::default()).unwrap();
    assert_eq!(Arc::strong_count(&artifact), 2);
    drop(instance);
    assert_eq!(Arc::strong_count(&artifact), 1);
}

#[test]
fn test_unknown_export() {
    let artifact = fixture_artifact(&registry());
    match artifact.run(&InstanceConfig::default(), "verify", b"{}") {
        Err(SigboxError::Execution(ExecutionError::UnknownExport(name))) => {
            assert_eq!(name, "verify")
        }
        other => panic!("expected UnknownExport, got {:?}", other),
    }
}

#[test]
fn test_abi_export_is_not_an_operation() {
    let artifact = fixture_artifact(&registry());
    assert!(matches!(
        artifact.run(&InstanceConfig::default(), "allocate", b"{}"),
        Err(SigboxError::Execution(ExecutionError::UnknownExport(_)))
    ));
}

#[test]
fn test_guest_failure_status() {
    let artifact = fixture_artifact(&registry());
    match artifact.run(&InstanceConfig::default(), "fail", b"{}") {
        Err(SigboxError::Execution(ExecutionError::GuestFailure {
            export,
            status,
            message,
        })) => {
            assert_eq!(export, "fail");
            assert_eq!(status, 1);
            assert_eq!(message, FIXTURE_ERROR);
        }
        other => panic!("expected GuestFailure, got {:?}", other),
    }
}

#[test]
fn test_malformed_request_status() {
    let artifact = fixture_artifact(&registry());
    match artifact.run(&InstanceConfig::default(), "reject", b"{}") {
        Err(SigboxError::Protocol(ProtocolError::MalformedRequest(message))) => {
            assert_eq!(message, FIXTURE_ERROR)
        }
        other => panic!("expected MalformedRequest, got {:?}", other),
    }
}

#[test]
fn test_trap() {
    let artifact = fixture_artifact(&registry());
    match artifact.run(&InstanceConfig::default(), "trap", b"{}") {
        Err(SigboxError::Execution(ExecutionError::Trap { export, .. })) => {
            assert_eq!(export, "trap")
        }
        other => panic!("expected Trap, got {:?}", other),
    }
}

#[test]
fn test_fuel_exhaustion() {
    let artifact = fixture_artifact(&registry());
    let config = InstanceConfig {
        fuel: 1_000_000,
        ..InstanceConfig::default()
    };
    assert!(matches!(
        artifact.run(&config, "spin", b"{}"),
        Err(SigboxError::Execution(ExecutionError::FuelExhausted { .. }))
    ));
}

fn unbounded_fuel() -> InstanceConfig {
    InstanceConfig {
        fuel: 1 << 40,
        ..InstanceConfig::default()
    }
}

#[test]
fn test_interrupt_stops_running_guest() {
    let artifact = fixture_artifact(&registry());
    let interrupt = artifact.interrupt_handle();

    let stopped = std::thread::scope(|scope| {
        let worker = scope.spawn(|| {
            artifact.run_interruptible(&unbounded_fuel(), "spin", b"{}", &interrupt)
        });
        std::thread::sleep(Duration::from_millis(50));
        interrupt.interrupt();
        worker.join().unwrap()
    });

    match stopped {
        Err(SigboxError::Execution(ExecutionError::Interrupted { export })) => {
            assert_eq!(export, "spin")
        }
        other => panic!("expected Interrupted, got {:?}", other),
    }
    assert_eq!(Arc::strong_count(&artifact), 1);
}

#[test]
fn test_interrupt_before_call() {
    let artifact = fixture_artifact(&registry());
    let interrupt = artifact.interrupt_handle();
    interrupt.interrupt();
    assert!(matches!(
        artifact.run_interruptible(&InstanceConfig::default(), "echo", b"{}", &interrupt),
        Err(SigboxError::Execution(ExecutionError::Interrupted { .. }))
    ));
}

#[test]
fn test_interrupt_leaves_other_instances_running() {
    let artifact = fixture_artifact(&registry());
    let interrupt = artifact.interrupt_handle();
    interrupt.interrupt();

    let out = artifact
        .run(&InstanceConfig::default(), "echo", b"still here")
        .unwrap();
    assert_eq!(out, b"still here");
}

#[test]
fn test_memory_limit_during_call() {
    let artifact = fixture_artifact(&registry());
    let config = InstanceConfig {
        max_memory_bytes: 2 * 65536,
        ..InstanceConfig::default()
    };
    assert!(matches!(
        artifact.run(&config, "grow", b"{}"),
        Err(SigboxError::Execution(ExecutionError::MemoryLimitExceeded { .. }))
    ));
}

#[test]
fn test_malformed_request_wins_over_denied_growth() {
    let artifact = fixture_artifact(&registry());
    let config = InstanceConfig {
        max_memory_bytes: 2 * 65536,
        ..InstanceConfig::default()
    };
    match artifact.run(&config, "grow_reject", b"{}") {
        Err(SigboxError::Protocol(ProtocolError::MalformedRequest(message))) => {
            assert_eq!(message, FIXTURE_ERROR)
        }
        other => panic!("expected MalformedRequest, got {:?}", other),
    }
}

#[test]
fn test_memory_limit_at_instantiation() {
    let wasm = wat::parse_str(r#"(module (memory (export "memory") 512))"#).unwrap();
    let artifact = registry().compile(&wasm, &ModuleManifest::new("big")).unwrap();
    assert!(matches!(
        artifact.instantiate(&InstanceConfig::default()),
        Err(SigboxError::Instantiation(InstantiationError::ResourceExhausted(_)))
    ));
}

#[test]
fn test_missing_abi_export() {
    let wasm = wat::parse_str(r#"(module (memory (export "memory") 1))"#).unwrap();
    let artifact = registry().compile(&wasm, &ModuleManifest::new("bare")).unwrap();
    match artifact.instantiate(&InstanceConfig::default()) {
        Err(SigboxError::Instantiation(InstantiationError::MissingExport { name, .. })) => {
            assert_eq!(name, "allocate")
        }
        other => panic!("expected MissingExport, got {:?}", other),
    }
}

#[test]
fn test_missing_manifest_export() {
    let manifest = fixture_manifest().with_export("verify");
    let artifact = registry().compile(&fixture_wasm(), &manifest).unwrap();
    match artifact.instantiate(&InstanceConfig::default()) {
        Err(SigboxError::Instantiation(InstantiationError::MissingExport { name, .. })) => {
            assert_eq!(name, "verify")
        }
        other => panic!("expected MissingExport, got {:?}", other),
    }
}

#[test]
fn test_artifact_compiled_once() {
    let registry = registry();
    let first = fixture_artifact(&registry);
    let second = fixture_artifact(&registry);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.cached(), 1);

    let other = registry
        .compile(&fixture_wasm(), &fixture_manifest().with_export("extra"))
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(registry.cached(), 2);
}

#[test]
fn test_compile_file() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("fixture.wasm"), fixture_wasm()).unwrap();
    std::fs::write(
        dir.path().join("fixture.yaml"),
        "name: fixture\nwasm: fixture.wasm\nhost_imports: [hmac256]\nexports: [echo]\n",
    )
    .unwrap();

    let artifact = registry()
        .compile_file(&dir.path().join("fixture.yaml"))
        .unwrap();
    assert_eq!(artifact.name(), "fixture");
    assert_eq!(
        artifact.run(&InstanceConfig::default(), "echo", b"[1]").unwrap(),
        b"[1]"
    );
}

#[test]
fn test_component_rejected() {
    let component = wat::parse_str("(component)").unwrap();
    assert!(matches!(
        registry().compile(&component, &ModuleManifest::new("c")),
        Err(SigboxError::Compilation(CompilationError::UnsupportedEncoding(_)))
    ));
}

#[test]
fn test_malformed_bytecode_rejected() {
    assert!(matches!(
        registry().compile(b"\0asm\x01\0\0\0garbage", &ModuleManifest::new("g")),
        Err(SigboxError::Compilation(CompilationError::InvalidBytecode(_)))
    ));
}

#[test]
fn test_import_not_declared_in_manifest() {
    let manifest = ModuleManifest::new("fixture").with_export("echo");
    match registry().compile(&fixture_wasm(), &manifest) {
        Err(SigboxError::Compilation(CompilationError::UndeclaredImport { module, name })) => {
            assert_eq!(module, "sigbox:host");
            assert_eq!(name, "hmac256");
        }
        other => panic!("expected UndeclaredImport, got {:?}", other),
    }
}
