// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Signing plugin for the sigbox host.
//!
//! Exports `add`, `hmac256_demo` and `sign` with the signature
//! `(input_ptr: i32, input_len: i32) -> i32`, plus the ABI exports `allocate`,
//! `deallocate`, `output_ptr` and `output_len`. The only import is `hmac256` from
//! `sigbox:host`.
//!
//! Build with `wasm_plugins/build.sh`.

pub mod abi;
pub mod host;
pub mod plugins;
pub mod token;

#[cfg(target_arch = "wasm32")]
mod exports {
    use crate::{abi, host::HostDigest, plugins};

    #[no_mangle]
    pub extern "C" fn allocate(size: i32) -> i32 {
        abi::allocate(size)
    }

    #[no_mangle]
    pub extern "C" fn deallocate(ptr: i32, size: i32) {
        abi::deallocate(ptr, size)
    }

    #[no_mangle]
    pub extern "C" fn output_ptr() -> i32 {
        abi::output_ptr()
    }

    #[no_mangle]
    pub extern "C" fn output_len() -> i32 {
        abi::output_len()
    }

    #[no_mangle]
    pub extern "C" fn add(input_ptr: i32, input_len: i32) -> i32 {
        abi::dispatch(input_ptr, input_len, plugins::add)
    }

    #[no_mangle]
    pub extern "C" fn hmac256_demo(input_ptr: i32, input_len: i32) -> i32 {
        abi::dispatch(input_ptr, input_len, |input| {
            plugins::hmac256_demo(input, &HostDigest)
        })
    }

    #[no_mangle]
    pub extern "C" fn sign(input_ptr: i32, input_len: i32) -> i32 {
        abi::dispatch(input_ptr, input_len, |input| plugins::sign(input, &HostDigest))
    }
}
