// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stack slots for the host calling convention.
//!
//! Every slot crosses the boundary as a wasm `i64`. A scalar slot carries its raw
//! value; a memory-reference slot packs an `(offset, length)` pair into the calling
//! instance's linear memory as `offset << 32 | length`.

use std::fmt;

use wasmtime::ValType;

use crate::errors::MemoryAccessError;

/// What a slot carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Scalar,
    MemoryRef,
}

impl SlotKind {
    /// Wasm value type used for this slot.
    pub fn val_type(self) -> ValType {
        ValType::I64
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Scalar => write!(f, "scalar"),
            SlotKind::MemoryRef => write!(f, "memory-reference"),
        }
    }
}

/// A region of one instance's linear memory.
///
/// Only meaningful inside the instance that allocated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryHandle {
    pub offset: u32,
    pub length: u32,
}

impl MemoryHandle {
    pub const EMPTY: MemoryHandle = MemoryHandle {
        offset: 0,
        length: 0,
    };

    pub fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// Packs the handle into a single slot value.
    pub fn pack(self) -> u64 {
        (u64::from(self.offset) << 32) | u64::from(self.length)
    }

    pub fn unpack(raw: u64) -> Self {
        Self {
            offset: (raw >> 32) as u32,
            length: (raw & 0xFFFF_FFFF) as u32,
        }
    }

    /// One past the last byte, computed without overflow.
    pub fn end(self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }

    pub fn is_empty(self) -> bool {
        self.length == 0
    }
}

/// One value on the host function stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Scalar(u64),
    MemoryRef(MemoryHandle),
}

impl Slot {
    pub fn kind(&self) -> SlotKind {
        match self {
            Slot::Scalar(_) => SlotKind::Scalar,
            Slot::MemoryRef(_) => SlotKind::MemoryRef,
        }
    }

    /// Interprets a raw stack value according to the declared kind.
    pub fn from_raw(kind: SlotKind, raw: u64) -> Self {
        match kind {
            SlotKind::Scalar => Slot::Scalar(raw),
            SlotKind::MemoryRef => Slot::MemoryRef(MemoryHandle::unpack(raw)),
        }
    }

    pub fn to_raw(self) -> u64 {
        match self {
            Slot::Scalar(value) => value,
            Slot::MemoryRef(handle) => handle.pack(),
        }
    }

    /// Returns the memory handle, or a typed error naming the slot position.
    pub fn as_memory_ref(&self, index: usize) -> Result<MemoryHandle, MemoryAccessError> {
        match self {
            Slot::MemoryRef(handle) => Ok(*handle),
            Slot::Scalar(_) => Err(MemoryAccessError::SlotKindMismatch {
                index,
                expected: SlotKind::MemoryRef,
            }),
        }
    }
}
