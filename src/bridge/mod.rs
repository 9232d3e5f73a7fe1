// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host Capability Bridge.
//!
//! The trusted layer between guest code and the host. It owns the calling convention
//! (typed stack slots, memory references packed into `i64`), the marshaling contract
//! for guest memory, and the table of host functions guests may import. The only
//! function registered by default is the keyed digest `hmac256`.
//!
//! ```text
//! guest                                   host
//! allocate(key), allocate(msg)
//! hmac256(key_ref, msg_ref) ───────────▶  read + bounds-check both refs
//!                                         HMAC-SHA256
//!                          ◀───────────  allocate(32) in guest, write, return ref
//! read digest, deallocate(digest)
//! ```

mod descriptor;
pub mod hmac256;
pub mod memory;
mod slot;

pub use descriptor::{HostFunctionDescriptor, HostFunctionTable, HostHandler, HOST_NAMESPACE};
pub use memory::{check_bounds, CallerMemory, GuestMemory};
pub use slot::{MemoryHandle, Slot, SlotKind};
