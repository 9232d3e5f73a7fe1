// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default fuel level for WASM execution (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

/// Default linear memory limit per instance (16 MiB)
pub const DEFAULT_MAX_MEMORY_BYTES: usize = 16 * 1024 * 1024;
/// Table element limit per instance
pub const MAX_TABLE_ELEMENTS: usize = 10_000;

/// Per-call watchdog used when the config file sets none (milliseconds)
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;
