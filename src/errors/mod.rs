// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for the signing-plugin host.
//!
//! Each boundary has its own `thiserror` enum; `SigboxError` wraps them so callers
//! can match on the category and decide on retry. Nothing in the core retries.

mod bridge;
mod config;
mod protocol;
mod sandbox;

pub use bridge::{BridgeError, CryptoBridgeError, MemoryAccessError};
pub use config::ConfigError;
pub use protocol::ProtocolError;
pub use sandbox::{
    CompilationError, ExecutionError, InstantiationError, WASM_UNSUPPORTED_ENCODING,
};

use thiserror::Error;

/// Top-level error for every public operation.
#[derive(Error, Debug)]
pub enum SigboxError {
    #[error("Compilation error: {0}")]
    Compilation(#[from] CompilationError),

    #[error("Instantiation error: {0}")]
    Instantiation(#[from] InstantiationError),

    #[error("Memory access error: {0}")]
    MemoryAccess(#[from] MemoryAccessError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Crypto bridge error: {0}")]
    CryptoBridge(#[from] CryptoBridgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BridgeError> for SigboxError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::MemoryAccess(e) => SigboxError::MemoryAccess(e),
            BridgeError::Crypto(e) => SigboxError::CryptoBridge(e),
        }
    }
}

/// Result type alias for host operations.
pub type SigboxResult<T> = Result<T, SigboxError>;
