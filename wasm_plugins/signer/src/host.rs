// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Access to the host's keyed digest.

use crate::abi::PluginError;

/// HMAC-SHA256 provider. Plugins never hash keys themselves.
pub trait KeyedDigest {
    fn hmac256(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, PluginError>;
}

/// Packs a region into one i64 slot: `offset << 32 | length`.
pub fn pack(offset: u32, length: u32) -> i64 {
    ((u64::from(offset) << 32) | u64::from(length)) as i64
}

pub fn unpack(raw: i64) -> (u32, u32) {
    let raw = raw as u64;
    ((raw >> 32) as u32, raw as u32)
}

/// The `sigbox:host` `hmac256` import.
#[cfg(target_arch = "wasm32")]
pub struct HostDigest;

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "sigbox:host")]
extern "C" {
    #[link_name = "hmac256"]
    fn host_hmac256(key: i64, message: i64) -> i64;
}

#[cfg(target_arch = "wasm32")]
impl KeyedDigest for HostDigest {
    fn hmac256(&self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, PluginError> {
        let key_ref = pack(key.as_ptr() as usize as u32, key.len() as u32);
        let message_ref = pack(message.as_ptr() as usize as u32, message.len() as u32);

        // SAFETY: both regions live in our memory for the duration of the call; the
        // host only reads them.
        let (offset, length) = unpack(unsafe { host_hmac256(key_ref, message_ref) });
        if length == 0 {
            return Err(PluginError::Failed("host returned an empty digest".to_string()));
        }

        // SAFETY: the host wrote `length` bytes into a region from our allocator and
        // handed ownership to us.
        let digest =
            unsafe { std::slice::from_raw_parts(offset as usize as *const u8, length as usize) }
                .to_vec();
        crate::abi::deallocate(offset as i32, length as i32);
        Ok(digest)
    }
}
