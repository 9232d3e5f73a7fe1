// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM file loading and validation
//!
//! Reads WASM binaries from disk and performs size validation. It does not parse
//! the binary format - that's the responsibility of the detector module.

use crate::errors::{CompilationError, SigboxError, SigboxResult};
use std::path::Path;

/// Maximum allowed size for WASM binaries (16 MB)
pub const MAX_WASM_SIZE: usize = 16 * 1024 * 1024;

/// Loads WASM bytes from a file and validates the size
///
/// # Arguments
/// * `path` - Path to the WASM file to load
///
/// # Returns
/// * `Ok(Vec<u8>)` - The WASM binary bytes
/// * `Err(SigboxError)` - If file cannot be read or size exceeds limit
pub fn load_wasm_bytes<P: AsRef<Path>>(path: P) -> SigboxResult<Vec<u8>> {
    use crate::observability::messages::registry::{ModuleLoadFailed, ModuleLoaded};

    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        let error = SigboxError::Io(e);
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &path.display().to_string(),
                error: &error,
            }
        );
        error
    })?;

    check_size(&bytes).map_err(|error| {
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &path.display().to_string(),
                error: &error,
            }
        );
        error
    })?;

    tracing::info!(
        "{}",
        ModuleLoaded {
            module_path: &path.display().to_string(),
            size_bytes: bytes.len(),
        }
    );

    Ok(bytes)
}

/// Rejects binaries larger than `MAX_WASM_SIZE`.
pub fn check_size(bytes: &[u8]) -> Result<(), CompilationError> {
    if bytes.len() > MAX_WASM_SIZE {
        return Err(CompilationError::TooLarge {
            size: bytes.len(),
            max: MAX_WASM_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_small_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let test_data = b"test wasm data";
        temp_file.write_all(test_data).unwrap();

        let result = load_wasm_bytes(temp_file.path());
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), test_data);
    }

    #[test]
    fn test_file_too_large() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let large_data = vec![0u8; MAX_WASM_SIZE + 1];
        temp_file.write_all(&large_data).unwrap();

        let result = load_wasm_bytes(temp_file.path());
        match result {
            Err(SigboxError::Compilation(CompilationError::TooLarge { size, max })) => {
                assert_eq!(size, MAX_WASM_SIZE + 1);
                assert_eq!(max, MAX_WASM_SIZE);
            }
            other => panic!("Expected TooLarge for oversized file, got {:?}", other),
        }
    }

    #[test]
    fn test_nonexistent_file() {
        let result = load_wasm_bytes("/nonexistent/path/to/file.wasm");
        assert!(matches!(result, Err(SigboxError::Io(_))));
    }

    #[test]
    fn test_max_size_boundary() {
        let max_data = vec![0u8; MAX_WASM_SIZE];
        assert!(check_size(&max_data).is_ok());
    }
}
