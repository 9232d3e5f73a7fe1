// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The keyed-digest primitive (`hmac256`) exposed to guest code.
//!
//! Guests pass the key and the message as memory references; the digest comes back
//! as a newly allocated region in the guest's memory which the guest must free.
//! Key bytes live only for the duration of the handler and are never logged.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::memory::GuestMemory;
use super::{HostFunctionDescriptor, Slot, SlotKind};
use crate::errors::{BridgeError, CryptoBridgeError};

/// Import name guests use for the keyed digest.
pub const HMAC256: &str = "hmac256";

/// Length of an HMAC-SHA256 digest.
pub const DIGEST_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

pub fn descriptor() -> HostFunctionDescriptor {
    HostFunctionDescriptor::new(
        HMAC256,
        vec![SlotKind::MemoryRef, SlotKind::MemoryRef],
        vec![SlotKind::MemoryRef],
        hmac256,
    )
}

/// HMAC-SHA256 over `message` with `key`.
pub fn keyed_digest(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoBridgeError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CryptoBridgeError::InvalidKey(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac256(memory: &mut dyn GuestMemory, params: &[Slot]) -> Result<Vec<Slot>, BridgeError> {
    let key_ref = params[0].as_memory_ref(0)?;
    let message_ref = params[1].as_memory_ref(1)?;

    let key = memory
        .read(key_ref)
        .map_err(|source| CryptoBridgeError::UnreadableInput { input: "key", source })?;
    let message = memory.read(message_ref).map_err(|source| {
        CryptoBridgeError::UnreadableInput {
            input: "message",
            source,
        }
    })?;

    let digest = keyed_digest(&key, &message)?;
    drop(key);

    let handle = memory
        .write_new(&digest)
        .map_err(|source| CryptoBridgeError::OutputUnavailable { source })?;
    Ok(vec![Slot::MemoryRef(handle)])
}
