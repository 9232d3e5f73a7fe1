// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised inside host functions at the sandbox boundary.
//!
//! Host functions have no guest-visible exception mechanism, so these errors abort the
//! guest call (as a trap) and are recovered by the instance with a downcast.

use crate::bridge::SlotKind;
use thiserror::Error;

/// A memory reference crossing the bridge could not be honoured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryAccessError {
    /// `offset + length` runs past the end of the calling instance's memory.
    #[error("Memory access out of bounds: {offset}+{length} exceeds memory size {memory_size}")]
    OutOfBounds {
        offset: u32,
        length: u32,
        memory_size: usize,
    },

    /// The calling instance does not export its linear memory.
    #[error("Instance does not export 'memory'")]
    MissingMemory,

    /// The guest's `allocate` export is missing or failed.
    #[error("Guest allocator unavailable: {0}")]
    AllocatorUnavailable(String),

    /// The guest allocator returned a null region.
    #[error("Guest allocator returned null for {0} bytes")]
    AllocationFailed(u32),

    /// A stack slot held the wrong kind of value.
    #[error("Slot {index} expected a {expected} value")]
    SlotKindMismatch { index: usize, expected: SlotKind },

    /// Wrong number of stack slots for the descriptor.
    #[error("Host function '{name}' expected {expected} slots, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// The keyed-digest primitive could not produce a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoBridgeError {
    /// The key or message reference could not be read.
    #[error("Keyed digest cannot read its {input}: {source}")]
    UnreadableInput {
        input: &'static str,
        #[source]
        source: MemoryAccessError,
    },

    /// The digest could not be handed back to the guest.
    #[error("Keyed digest output could not be written to guest memory: {source}")]
    OutputUnavailable {
        #[source]
        source: MemoryAccessError,
    },

    /// The MAC rejected the key.
    #[error("Keyed digest rejected the key: {0}")]
    InvalidKey(String),
}

/// Everything a host function handler may fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error(transparent)]
    MemoryAccess(#[from] MemoryAccessError),

    #[error(transparent)]
    Crypto(#[from] CryptoBridgeError),
}
