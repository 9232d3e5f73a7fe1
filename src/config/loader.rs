// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_FUEL_LEVEL, DEFAULT_MAX_MEMORY_BYTES, MAX_FUEL_LEVEL,
    MIN_FUEL_LEVEL,
};
use crate::errors::ConfigError;
use crate::sandbox::InstanceConfig;
use crate::signer::SignerKind;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host configuration.
///
/// Loaded from YAML, or from TOML when the file ends in `.toml`.
///
/// # Fields
/// * `plugin` - Which plugin to load and which signer it serves
/// * `sandbox` - Per-instance resource limits (optional)
/// * `pool` - Signing pool sizing and watchdog (optional)
///
/// # Example
/// ```yaml
/// plugin:
///   manifest: wasm_plugins/signer.yaml
///   variant: authorization_issuer
/// sandbox:
///   fuel:
///     default: 100000000
///   max_memory_bytes: 16777216
/// pool:
///   max_concurrency: 4
///   call_timeout_ms: 5000
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    pub plugin: PluginConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

/// The plugin to load.
///
/// `manifest` is resolved relative to the config file by `load_config`.
#[derive(Debug, Deserialize)]
pub struct PluginConfig {
    pub manifest: PathBuf,
    pub variant: SignerKind,
}

/// Resource limits applied to every instance.
#[derive(Debug, Default, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
    pub max_memory_bytes: Option<usize>,
}

impl SandboxConfig {
    pub fn get_max_memory_bytes(&self) -> usize {
        self.max_memory_bytes.unwrap_or(DEFAULT_MAX_MEMORY_BYTES)
    }

    /// Instance budget: the default fuel level clamped to bounds, plus the memory limit.
    pub fn instance_config(&self) -> InstanceConfig {
        InstanceConfig {
            fuel: self.fuel.validate_and_clamp(self.fuel.get_default()),
            max_memory_bytes: self.get_max_memory_bytes(),
        }
    }
}

/// Fuel consumption configuration for WASM execution.
///
/// Fuel limits prevent infinite loops and resource exhaustion by limiting the number
/// of instructions a guest can execute. All values are optional and validated
/// against security bounds.
///
/// # Fields
/// * `default` - Fuel given to each instance (defaults to 100M)
/// * `minimum` - Minimum allowed fuel level (defaults to 1M)
/// * `maximum` - Maximum allowed fuel level (defaults to 500M) - security limit
///
/// # Example
/// ```yaml
/// fuel:
///   default: 100000000   # 100 million instructions
///   minimum: 1000000     # 1 million instructions
///   maximum: 500000000   # 500 million instructions (hard limit)
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    /// Get the default fuel level, using built-in default if not configured.
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    /// Get the minimum fuel level, using built-in default if not configured.
    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    /// Get the maximum fuel level, using built-in default if not configured.
    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Validate and clamp a fuel level to configured bounds.
    ///
    /// # Example
    /// ```
    /// use sigbox::config::FuelConfig;
    ///
    /// let config = FuelConfig::default();
    /// let fuel = config.validate_and_clamp(1_000_000_000); // Too high
    /// assert_eq!(fuel, 500_000_000); // Clamped to maximum
    /// ```
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        let min = self.get_minimum();
        let max = self.get_maximum();
        let clamped = requested.max(min).min(max);
        if clamped != requested {
            tracing::warn!(
                "Fuel level {} outside [{}, {}], using {}",
                requested,
                min,
                max,
                clamped
            );
        }
        clamped
    }
}

/// Signing pool options.
#[derive(Debug, Default, Deserialize)]
pub struct PoolConfig {
    pub max_concurrency: Option<usize>,
    /// Per-call watchdog in milliseconds; `0` disables it.
    pub call_timeout_ms: Option<u64>,
}

impl PoolConfig {
    /// Configured concurrency, or the machine's available parallelism.
    pub fn get_max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        match self.call_timeout_ms.unwrap_or(DEFAULT_CALL_TIMEOUT_MS) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Load a config from a YAML or TOML file.
///
/// A relative `plugin.manifest` is resolved against the config file's directory.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |reason: String| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let mut cfg: Config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        _ => serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
    };

    if cfg.plugin.manifest.is_relative() {
        if let Some(dir) = path.parent() {
            cfg.plugin.manifest = dir.join(&cfg.plugin.manifest);
        }
    }
    Ok(cfg)
}

/// Load and validate a config file.
///
/// Rejects a zero pool size, a zero memory limit and inverted fuel bounds.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if cfg.pool.max_concurrency == Some(0) {
        errors.push("pool.max_concurrency must be greater than 0".to_string());
    }
    if cfg.sandbox.max_memory_bytes == Some(0) {
        errors.push("sandbox.max_memory_bytes must be greater than 0".to_string());
    }
    let fuel = &cfg.sandbox.fuel;
    if fuel.get_minimum() > fuel.get_maximum() {
        errors.push(format!(
            "sandbox.fuel.minimum ({}) exceeds sandbox.fuel.maximum ({})",
            fuel.get_minimum(),
            fuel.get_maximum()
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "Configuration validation failed:\n{}",
            errors.join("\n")
        )))
    }
}
