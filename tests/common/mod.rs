// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use sigbox::sandbox::{CompiledArtifact, ModuleManifest, ModuleRegistry};

/// Key baked into the fixture's data segment at offset 64.
pub const FIXTURE_KEY: &[u8] = b"1234567890";
/// Message the fixture's failing exports leave in the output channel.
pub const FIXTURE_ERROR: &str = "guest refused request";

/// Guest module speaking the plugin ABI with a bump allocator.
///
/// Exports:
/// * `echo` - output = request
/// * `fail` / `reject` - status 1 / 2 with `FIXTURE_ERROR`
/// * `trap` - `unreachable`
/// * `spin` - loops until fuel runs out
/// * `grow` - asks for 1000 more pages, fails with status 1 if refused
/// * `grow_reject` - asks for 1000 more pages, then rejects the request with status 2
/// * `digest` / `hmac256_demo` - output = hmac256(FIXTURE_KEY, request) via the host
/// * `digest_oob` - passes an out-of-bounds key reference to the host
/// * `add` - always outputs `3`
/// * `bad_json` / `sign` - status 0 with `not json`
pub const FIXTURE_WAT: &str = r#"
(module
  (import "sigbox:host" "hmac256" (func $hmac256 (param i64 i64) (result i64)))
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))
  (global $out_ptr (mut i32) (i32.const 0))
  (global $out_len (mut i32) (i32.const 0))

  (data (i32.const 16) "guest refused request")
  (data (i32.const 64) "1234567890")
  (data (i32.const 80) "not json")
  (data (i32.const 96) "3")

  (func $allocate (export "allocate") (param $size i32) (result i32)
    (local $ptr i32)
    (local $end i32)
    (local $have i32)
    (local.set $ptr (global.get $heap))
    (local.set $end (i32.add (local.get $ptr) (local.get $size)))
    (local.set $have (i32.mul (memory.size) (i32.const 65536)))
    (if (i32.gt_u (local.get $end) (local.get $have))
      (then
        (if (i32.eq
              (memory.grow
                (i32.add
                  (i32.shr_u (i32.sub (local.get $end) (local.get $have)) (i32.const 16))
                  (i32.const 1)))
              (i32.const -1))
          (then (return (i32.const 0))))))
    (global.set $heap (local.get $end))
    (local.get $ptr))

  (func (export "deallocate") (param i32 i32))
  (func (export "output_ptr") (result i32) (global.get $out_ptr))
  (func (export "output_len") (result i32) (global.get $out_len))

  (func $set_output (param $ptr i32) (param $len i32)
    (global.set $out_ptr (local.get $ptr))
    (global.set $out_len (local.get $len)))

  (func $ref (param $ptr i32) (param $len i32) (result i64)
    (i64.or
      (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
      (i64.extend_i32_u (local.get $len))))

  (func $digest (param $ptr i32) (param $len i32) (result i32)
    (local $h i64)
    (local.set $h
      (call $hmac256
        (call $ref (i32.const 64) (i32.const 10))
        (call $ref (local.get $ptr) (local.get $len))))
    (call $set_output
      (i32.wrap_i64 (i64.shr_u (local.get $h) (i64.const 32)))
      (i32.wrap_i64 (local.get $h)))
    (i32.const 0))

  (func (export "echo") (param $ptr i32) (param $len i32) (result i32)
    (call $set_output (local.get $ptr) (local.get $len))
    (i32.const 0))

  (func (export "fail") (param i32 i32) (result i32)
    (call $set_output (i32.const 16) (i32.const 21))
    (i32.const 1))

  (func (export "reject") (param i32 i32) (result i32)
    (call $set_output (i32.const 16) (i32.const 21))
    (i32.const 2))

  (func (export "trap") (param i32 i32) (result i32)
    unreachable)

  (func (export "spin") (param i32 i32) (result i32)
    (loop $forever (br $forever))
    (i32.const 0))

  (func (export "grow") (param i32 i32) (result i32)
    (if (i32.eq (memory.grow (i32.const 1000)) (i32.const -1))
      (then
        (call $set_output (i32.const 16) (i32.const 21))
        (return (i32.const 1))))
    (i32.const 0))

  (func (export "grow_reject") (param i32 i32) (result i32)
    (drop (memory.grow (i32.const 1000)))
    (call $set_output (i32.const 16) (i32.const 21))
    (i32.const 2))

  (func (export "digest") (param i32 i32) (result i32)
    (call $digest (local.get 0) (local.get 1)))

  (func (export "hmac256_demo") (param i32 i32) (result i32)
    (call $digest (local.get 0) (local.get 1)))

  (func (export "digest_oob") (param $ptr i32) (param $len i32) (result i32)
    (drop
      (call $hmac256
        (call $ref (i32.const -65536) (i32.const 64))
        (call $ref (local.get $ptr) (local.get $len))))
    (i32.const 0))

  (func (export "add") (param i32 i32) (result i32)
    (call $set_output (i32.const 96) (i32.const 1))
    (i32.const 0))

  (func $bad_json (export "bad_json") (param i32 i32) (result i32)
    (call $set_output (i32.const 80) (i32.const 8))
    (i32.const 0))

  (func (export "sign") (param i32 i32) (result i32)
    (call $bad_json (local.get 0) (local.get 1)))
)
"#;

pub const FIXTURE_EXPORTS: [&str; 13] = [
    "echo",
    "fail",
    "reject",
    "trap",
    "spin",
    "grow",
    "grow_reject",
    "digest",
    "hmac256_demo",
    "digest_oob",
    "add",
    "bad_json",
    "sign",
];

pub fn fixture_wasm() -> Vec<u8> {
    wat::parse_str(FIXTURE_WAT).expect("fixture WAT should parse")
}

pub fn fixture_manifest() -> ModuleManifest {
    FIXTURE_EXPORTS
        .iter()
        .fold(ModuleManifest::new("fixture").with_host_import("hmac256"), |m, e| {
            m.with_export(*e)
        })
}

pub fn fixture_artifact(registry: &ModuleRegistry) -> Arc<CompiledArtifact> {
    registry
        .compile(&fixture_wasm(), &fixture_manifest())
        .expect("fixture should compile")
}

/// A module whose only export is `add`, which never returns.
pub const SLOW_ADD_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "allocate") (param i32) (result i32) (i32.const 1024))
  (func (export "deallocate") (param i32 i32))
  (func (export "output_ptr") (result i32) (i32.const 0))
  (func (export "output_len") (result i32) (i32.const 0))
  (func (export "add") (param i32 i32) (result i32)
    (loop $forever (br $forever))
    (i32.const 0))
)
"#;

/// The compiled signing plugin, if `wasm_plugins/build.sh` has been run.
pub fn signer_manifest_path() -> Option<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("wasm_plugins");
    if dir.join("signer.wasm").exists() {
        Some(dir.join("signer.yaml"))
    } else {
        eprintln!("Skipping: wasm_plugins/signer.wasm not built (run wasm_plugins/build.sh)");
        None
    }
}
