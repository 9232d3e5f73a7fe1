// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading host configuration or plugin manifests.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read from disk.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid YAML/TOML/JSON for the expected shape.
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The configuration parsed but violates a constraint.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
