// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary encoding detection
//!
//! Detection of WASM binary formats using wasmparser. Signing plugins
//! must be classic core modules; Component Model binaries and legacy Preview 1
//! components are rejected before compilation.

use crate::errors::{CompilationError, WASM_UNSUPPORTED_ENCODING};

use wasmparser::{Encoding, Parser, Payload};

/// Encoding of a WebAssembly binary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WasmEncoding {
    /// Classic core module (binary version 1, no component section)
    CoreModule,
    /// Component Model binary (version 2+)
    Component,
    /// Legacy Preview 1 component (version 1 + "component" custom section)
    LegacyComponent,
}

impl WasmEncoding {
    /// Returns true if this host can run the binary.
    #[inline]
    pub fn is_supported(self) -> bool {
        matches!(self, Self::CoreModule)
    }
}

/// Detects the encoding of a WebAssembly binary by inspecting its version header
/// and (for version 1) custom sections.
///
/// # Errors
/// Returns `CompilationError::InvalidBytecode` if the input is empty, truncated, or
/// otherwise invalid per the WASM binary format.
pub fn detect_encoding(bytes: &[u8]) -> Result<WasmEncoding, CompilationError> {
    let parser = Parser::new(0);
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in parser.parse_all(bytes) {
        let payload = payload.map_err(|e| CompilationError::InvalidBytecode(e.to_string()))?;
        match payload {
            Payload::Version { encoding: enc, .. } => {
                encoding = Some(enc);
            }
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    let encoding = encoding
        .ok_or_else(|| CompilationError::InvalidBytecode("Invalid WASM binary".to_string()))?;

    Ok(match encoding {
        Encoding::Component => WasmEncoding::Component,
        Encoding::Module if has_component_section => WasmEncoding::LegacyComponent,
        Encoding::Module => WasmEncoding::CoreModule,
    })
}

/// Fails unless `bytes` is a core WebAssembly module.
pub fn ensure_core_module(bytes: &[u8]) -> Result<(), CompilationError> {
    let encoding = detect_encoding(bytes)?;
    if !encoding.is_supported() {
        tracing::debug!("Rejecting {:?} binary", encoding);
        return Err(CompilationError::UnsupportedEncoding(
            WASM_UNSUPPORTED_ENCODING.to_string(),
        ));
    }
    Ok(())
}
