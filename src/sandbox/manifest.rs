// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Module manifest: the host imports a plugin may use and the operations it exports.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Declares what a guest module imports from the host and what it exports.
///
/// Loaded from YAML; JSON manifests parse too since YAML is a superset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Artifact name used in logs and errors.
    pub name: String,

    /// Path to the WASM file (relative to manifest).
    #[serde(default = "default_wasm_path")]
    pub wasm: String,

    /// Host functions the module imports from `sigbox:host`.
    #[serde(default)]
    pub host_imports: Vec<String>,

    /// Operation exports callable through the guest protocol.
    #[serde(default)]
    pub exports: Vec<String>,
}

/// Guest ABI exports; these cannot be called as operations.
pub const RESERVED_EXPORTS: [&str; 5] = ["memory", "allocate", "deallocate", "output_ptr", "output_len"];

fn default_wasm_path() -> String {
    "plugin.wasm".to_string()
}

impl ModuleManifest {
    /// Creates a manifest with no imports and no exports.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wasm: default_wasm_path(),
            host_imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn with_host_import(mut self, name: impl Into<String>) -> Self {
        self.host_imports.push(name.into());
        self
    }

    pub fn with_export(mut self, name: impl Into<String>) -> Self {
        self.exports.push(name.into());
        self
    }

    pub fn with_wasm(mut self, wasm: impl Into<String>) -> Self {
        self.wasm = wasm.into();
        self
    }

    /// Loads a manifest from a YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parses a manifest from a YAML or JSON string.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline manifest>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let manifest: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks the manifest is self-consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "manifest name cannot be empty".to_string(),
            ));
        }
        if let Some(dup) = first_duplicate(&self.host_imports) {
            return Err(ConfigError::Invalid(format!(
                "manifest '{}' declares host import '{}' twice",
                self.name, dup
            )));
        }
        if let Some(reserved) = self
            .exports
            .iter()
            .find(|e| RESERVED_EXPORTS.contains(&e.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "manifest '{}' lists ABI export '{}' as an operation",
                self.name, reserved
            )));
        }
        if let Some(dup) = first_duplicate(&self.exports) {
            return Err(ConfigError::Invalid(format!(
                "manifest '{}' declares export '{}' twice",
                self.name, dup
            )));
        }
        Ok(())
    }

    /// Resolves the WASM path against the directory holding the manifest.
    pub fn wasm_path(&self, manifest_dir: &Path) -> PathBuf {
        let wasm = Path::new(&self.wasm);
        if wasm.is_absolute() {
            wasm.to_path_buf()
        } else {
            manifest_dir.join(wasm)
        }
    }

    pub fn declares_import(&self, name: &str) -> bool {
        self.host_imports.iter().any(|n| n == name)
    }

    pub fn declares_export(&self, name: &str) -> bool {
        self.exports.iter().any(|n| n == name)
    }

    /// Canonical bytes used to fingerprint the manifest.
    pub(crate) fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in [&self.name, &self.wasm] {
            out.extend_from_slice(part.as_bytes());
            out.push(0);
        }
        for list in [&self.host_imports, &self.exports] {
            out.extend_from_slice(&(list.len() as u32).to_le_bytes());
            for item in list {
                out.extend_from_slice(item.as_bytes());
                out.push(0);
            }
        }
        out
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(item))
        .map(|(_, item)| item.as_str())
}
