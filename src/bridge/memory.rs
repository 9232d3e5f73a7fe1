// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest memory access for host functions.
//!
//! Guest→host data is read through a bounds-checked copy; the source buffer stays owned
//! by the guest. Host→guest data is written into a fresh region obtained from the
//! guest's own `allocate` export, and ownership of that region passes to the guest.

use std::ops::Range;

use wasmtime::{Caller, Extern, Memory};

use super::MemoryHandle;
use crate::errors::MemoryAccessError;

/// Name of the guest export used for host→guest allocations.
pub const ALLOCATE_EXPORT: &str = "allocate";
/// Name of the guest's linear memory export.
pub const MEMORY_EXPORT: &str = "memory";

/// Linear memory of the instance that made the current host call.
pub trait GuestMemory {
    /// Copies the referenced region out of guest memory.
    fn read(&mut self, handle: MemoryHandle) -> Result<Vec<u8>, MemoryAccessError>;

    /// Allocates a new guest region, writes `bytes` into it and returns its handle.
    fn write_new(&mut self, bytes: &[u8]) -> Result<MemoryHandle, MemoryAccessError>;
}

/// Validates `handle` against a memory of `memory_size` bytes.
pub fn check_bounds(
    handle: MemoryHandle,
    memory_size: usize,
) -> Result<Range<usize>, MemoryAccessError> {
    if handle.end() > memory_size as u64 {
        return Err(MemoryAccessError::OutOfBounds {
            offset: handle.offset,
            length: handle.length,
            memory_size,
        });
    }
    let start = handle.offset as usize;
    Ok(start..start + handle.length as usize)
}

/// `GuestMemory` over the wasmtime caller of a host function.
pub struct CallerMemory<'a, 'c, T: 'static> {
    caller: &'a mut Caller<'c, T>,
}

impl<'a, 'c, T: 'static> CallerMemory<'a, 'c, T> {
    pub fn new(caller: &'a mut Caller<'c, T>) -> Self {
        Self { caller }
    }

    fn memory(&mut self) -> Result<Memory, MemoryAccessError> {
        self.caller
            .get_export(MEMORY_EXPORT)
            .and_then(Extern::into_memory)
            .ok_or(MemoryAccessError::MissingMemory)
    }
}

impl<T: 'static> GuestMemory for CallerMemory<'_, '_, T> {
    fn read(&mut self, handle: MemoryHandle) -> Result<Vec<u8>, MemoryAccessError> {
        let memory = self.memory()?;
        let data = memory.data(&*self.caller);
        let range = check_bounds(handle, data.len())?;
        Ok(data[range].to_vec())
    }

    fn write_new(&mut self, bytes: &[u8]) -> Result<MemoryHandle, MemoryAccessError> {
        let length = u32::try_from(bytes.len()).map_err(|_| {
            MemoryAccessError::AllocatorUnavailable(format!(
                "{} bytes does not fit a 32-bit memory",
                bytes.len()
            ))
        })?;
        if length == 0 {
            return Ok(MemoryHandle::EMPTY);
        }

        let allocate = self
            .caller
            .get_export(ALLOCATE_EXPORT)
            .and_then(Extern::into_func)
            .ok_or_else(|| {
                MemoryAccessError::AllocatorUnavailable(format!(
                    "instance does not export '{}'",
                    ALLOCATE_EXPORT
                ))
            })?
            .typed::<i32, i32>(&*self.caller)
            .map_err(|e| MemoryAccessError::AllocatorUnavailable(e.to_string()))?;

        let ptr = allocate
            .call(&mut *self.caller, length as i32)
            .map_err(|e| MemoryAccessError::AllocatorUnavailable(e.to_string()))?;
        if ptr == 0 {
            return Err(MemoryAccessError::AllocationFailed(length));
        }

        // Re-fetch memory: allocate may have grown it.
        let memory = self.memory()?;
        let handle = MemoryHandle::new(ptr as u32, length);
        let range = check_bounds(handle, memory.data_size(&*self.caller))?;
        memory.data_mut(&mut *self.caller)[range].copy_from_slice(bytes);
        Ok(handle)
    }
}

/// In-process `GuestMemory` used to unit test host handlers without a sandbox.
#[cfg(test)]
pub(crate) struct VecMemory {
    pub data: Vec<u8>,
    next: usize,
    pub allocations: Vec<MemoryHandle>,
}

#[cfg(test)]
impl VecMemory {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            next: 8,
            allocations: Vec::new(),
        }
    }

    /// Places `bytes` in memory as if the guest had allocated them.
    pub fn place(&mut self, bytes: &[u8]) -> MemoryHandle {
        let handle = MemoryHandle::new(self.next as u32, bytes.len() as u32);
        self.data[self.next..self.next + bytes.len()].copy_from_slice(bytes);
        self.next += bytes.len();
        handle
    }
}

#[cfg(test)]
impl GuestMemory for VecMemory {
    fn read(&mut self, handle: MemoryHandle) -> Result<Vec<u8>, MemoryAccessError> {
        let range = check_bounds(handle, self.data.len())?;
        Ok(self.data[range].to_vec())
    }

    fn write_new(&mut self, bytes: &[u8]) -> Result<MemoryHandle, MemoryAccessError> {
        if self.next + bytes.len() > self.data.len() {
            return Err(MemoryAccessError::AllocationFailed(bytes.len() as u32));
        }
        let handle = self.place(bytes);
        self.allocations.push(handle);
        Ok(handle)
    }
}
