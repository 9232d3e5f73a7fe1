// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Guest side of the plugin ABI: allocator exports and the output channel.

use std::alloc::{alloc, dealloc, Layout};
use std::cell::RefCell;

/// Success; the output channel holds the response.
pub const STATUS_OK: i32 = 0;
/// Failure; the output channel holds an error message.
pub const STATUS_FAILED: i32 = 1;
/// The request did not parse; the output channel holds an error message.
pub const STATUS_MALFORMED: i32 = 2;

/// Why an operation did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    Malformed(String),
    Failed(String),
}

impl PluginError {
    pub fn status(&self) -> i32 {
        match self {
            PluginError::Malformed(_) => STATUS_MALFORMED,
            PluginError::Failed(_) => STATUS_FAILED,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PluginError::Malformed(m) | PluginError::Failed(m) => m,
        }
    }
}

thread_local! {
    static OUTPUT: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

/// Runs `op` on the request bytes and stores its response (or error message) in
/// the output channel. Returns the status code for the host.
pub fn dispatch<F>(input_ptr: i32, input_len: i32, op: F) -> i32
where
    F: FnOnce(&[u8]) -> Result<Vec<u8>, PluginError>,
{
    let input: &[u8] = if input_len <= 0 {
        &[]
    } else {
        // SAFETY: the host wrote `input_len` bytes at `input_ptr` from our allocator.
        unsafe { std::slice::from_raw_parts(input_ptr as usize as *const u8, input_len as usize) }
    };

    let (status, output) = match op(input) {
        Ok(response) => (STATUS_OK, response),
        Err(error) => (error.status(), error.message().as_bytes().to_vec()),
    };
    OUTPUT.with(|cell| *cell.borrow_mut() = output);
    status
}

pub fn output_ptr() -> i32 {
    OUTPUT.with(|cell| cell.borrow().as_ptr() as usize as i32)
}

pub fn output_len() -> i32 {
    OUTPUT.with(|cell| cell.borrow().len() as i32)
}

fn layout(size: usize) -> Option<Layout> {
    Layout::from_size_align(size, 1).ok()
}

/// Allocates `size` bytes; returns 0 when `size` is not positive or memory is exhausted.
pub fn allocate(size: i32) -> i32 {
    if size <= 0 {
        return 0;
    }
    match layout(size as usize) {
        // SAFETY: layout has non-zero size.
        Some(layout) => unsafe { alloc(layout) as usize as i32 },
        None => 0,
    }
}

/// Frees a region returned by `allocate`, including regions the host allocated
/// on the guest's behalf.
pub fn deallocate(ptr: i32, size: i32) {
    if ptr == 0 || size <= 0 {
        return;
    }
    if let Some(layout) = layout(size as usize) {
        // SAFETY: `ptr` came from `allocate(size)` with the same layout.
        unsafe { dealloc(ptr as usize as *mut u8, layout) }
    }
}
