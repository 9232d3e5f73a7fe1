// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host-side facade over a signing plugin.
//!
//! A `PluginSigner` is bound to one artifact and one `SignerKind`. Each request
//! runs in a fresh instance; the signer itself holds no per-call state.

pub mod token;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bridge::hmac256::DIGEST_LEN;
use crate::errors::{ExecutionError, ProtocolError, SigboxResult};
use crate::protocol::{
    decode_decimal, decode_json, encode_request, ensure_json, AddRequest, DigestRequest,
    SignInput, SignOutput,
};
use crate::sandbox::{CompiledArtifact, InstanceConfig, InterruptHandle};

pub use token::{verify_bearer, AuthorizationClaims, TOKEN_LIFETIME_SECS};

/// The signing operations a plugin can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerKind {
    /// `add`: sums two integers. Protocol smoke test.
    Arithmetic,
    /// `hmac256_demo`: returns the digest computed by the host `hmac256` import.
    DelegatedDigest,
    /// `sign`: issues an HS256 bearer token for an HTTP request.
    AuthorizationIssuer,
}

impl SignerKind {
    pub const ALL: [SignerKind; 3] = [
        SignerKind::Arithmetic,
        SignerKind::DelegatedDigest,
        SignerKind::AuthorizationIssuer,
    ];

    /// Name of the guest export implementing this kind.
    pub fn export(self) -> &'static str {
        match self {
            SignerKind::Arithmetic => "add",
            SignerKind::DelegatedDigest => "hmac256_demo",
            SignerKind::AuthorizationIssuer => "sign",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignerKind::Arithmetic => "arithmetic",
            SignerKind::DelegatedDigest => "delegated_digest",
            SignerKind::AuthorizationIssuer => "authorization_issuer",
        }
    }
}

impl fmt::Display for SignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown signer variant '{}'", s))
    }
}

/// A request for any signer kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerRequest {
    Add(AddRequest),
    Digest(DigestRequest),
    Sign(SignInput),
}

impl SignerRequest {
    pub fn kind(&self) -> SignerKind {
        match self {
            SignerRequest::Add(_) => SignerKind::Arithmetic,
            SignerRequest::Digest(_) => SignerKind::DelegatedDigest,
            SignerRequest::Sign(_) => SignerKind::AuthorizationIssuer,
        }
    }
}

/// A decoded response for any signer kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerResponse {
    Sum(i64),
    Digest(Vec<u8>),
    Signed(SignOutput),
}

/// Runs signing requests against one compiled plugin.
#[derive(Debug, Clone)]
pub struct PluginSigner {
    artifact: Arc<CompiledArtifact>,
    kind: SignerKind,
    config: InstanceConfig,
}

impl PluginSigner {
    /// Binds `artifact` to `kind`. Fails if the artifact's manifest does not export
    /// the operation for that kind.
    pub fn new(
        artifact: Arc<CompiledArtifact>,
        kind: SignerKind,
        config: InstanceConfig,
    ) -> SigboxResult<Self> {
        if !artifact.manifest().declares_export(kind.export()) {
            return Err(ExecutionError::UnknownExport(kind.export().to_string()).into());
        }
        Ok(Self {
            artifact,
            kind,
            config,
        })
    }

    pub fn kind(&self) -> SignerKind {
        self.kind
    }

    pub fn artifact(&self) -> &Arc<CompiledArtifact> {
        &self.artifact
    }

    pub fn instance_config(&self) -> &InstanceConfig {
        &self.config
    }

    /// A handle for stopping one call started with `execute_interruptible`.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.artifact.interrupt_handle()
    }

    /// Runs `request` in a fresh instance and decodes the typed response.
    pub fn execute(&self, request: &SignerRequest) -> SigboxResult<SignerResponse> {
        self.execute_interruptible(request, &self.interrupt_handle())
    }

    /// `execute`, stoppable from another thread through `interrupt`.
    pub fn execute_interruptible(
        &self,
        request: &SignerRequest,
        interrupt: &InterruptHandle,
    ) -> SigboxResult<SignerResponse> {
        self.expect_kind(request.kind())?;
        match request {
            SignerRequest::Add(req) => self.invoke_add(req, interrupt).map(SignerResponse::Sum),
            SignerRequest::Digest(req) => {
                self.invoke_digest(req, interrupt).map(SignerResponse::Digest)
            }
            SignerRequest::Sign(req) => self.invoke_sign(req, interrupt).map(SignerResponse::Signed),
        }
    }

    pub fn add(&self, a: i64, b: i64) -> SigboxResult<i64> {
        self.expect_kind(SignerKind::Arithmetic)?;
        self.invoke_add(&AddRequest { a, b }, &self.interrupt_handle())
    }

    pub fn digest(&self, key: &str, to_sign_string: &str) -> SigboxResult<Vec<u8>> {
        self.expect_kind(SignerKind::DelegatedDigest)?;
        self.invoke_digest(&DigestRequest::new(key, to_sign_string), &self.interrupt_handle())
    }

    pub fn sign(&self, input: &SignInput) -> SigboxResult<SignOutput> {
        self.expect_kind(SignerKind::AuthorizationIssuer)?;
        self.invoke_sign(input, &self.interrupt_handle())
    }

    /// Sends raw request bytes to the configured export and returns the raw output.
    ///
    /// Bytes that are not JSON are rejected before a guest instance is created.
    pub fn call_raw(&self, request: &[u8]) -> SigboxResult<Vec<u8>> {
        self.call_guest(request, &self.interrupt_handle())
    }

    fn call_guest(&self, request: &[u8], interrupt: &InterruptHandle) -> SigboxResult<Vec<u8>> {
        ensure_json(request)?;
        self.artifact
            .run_interruptible(&self.config, self.kind.export(), request, interrupt)
    }

    fn expect_kind(&self, requested: SignerKind) -> Result<(), ProtocolError> {
        if requested != self.kind {
            return Err(ProtocolError::VariantMismatch {
                configured: self.kind.to_string(),
                requested: requested.to_string(),
            });
        }
        Ok(())
    }

    fn invoke_add(&self, request: &AddRequest, interrupt: &InterruptHandle) -> SigboxResult<i64> {
        let output = self.call_guest(&encode_request(request)?, interrupt)?;
        Ok(decode_decimal(self.kind.export(), &output)?)
    }

    fn invoke_digest(
        &self,
        request: &DigestRequest,
        interrupt: &InterruptHandle,
    ) -> SigboxResult<Vec<u8>> {
        let output = self.call_guest(&encode_request(request)?, interrupt)?;
        if output.len() != DIGEST_LEN {
            return Err(ProtocolError::InvalidResponse {
                export: self.kind.export().to_string(),
                reason: format!("expected {} digest bytes, got {}", DIGEST_LEN, output.len()),
            }
            .into());
        }
        Ok(output)
    }

    fn invoke_sign(
        &self,
        request: &SignInput,
        interrupt: &InterruptHandle,
    ) -> SigboxResult<SignOutput> {
        let output = self.call_guest(&encode_request(request)?, interrupt)?;
        Ok(decode_json(self.kind.export(), &output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_exports() {
        assert_eq!(SignerKind::Arithmetic.export(), "add");
        assert_eq!(SignerKind::DelegatedDigest.export(), "hmac256_demo");
        assert_eq!(SignerKind::AuthorizationIssuer.export(), "sign");
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in SignerKind::ALL {
            let yaml = serde_yaml::to_string(&kind).unwrap();
            assert_eq!(yaml.trim(), kind.as_str());
            assert_eq!(kind.as_str().parse::<SignerKind>().unwrap(), kind);
        }
        assert!("hmac".parse::<SignerKind>().is_err());
    }

    #[test]
    fn test_request_kind() {
        let add = SignerRequest::Add(AddRequest { a: 1, b: 2 });
        assert_eq!(add.kind(), SignerKind::Arithmetic);
        let digest = SignerRequest::Digest(DigestRequest::new("k", "m"));
        assert_eq!(digest.kind(), SignerKind::DelegatedDigest);
    }
}
