// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Identity & Signing
//!
//! Every agent owns one Ed25519 keypair. Signatures are detached and always
//! computed over the canonical JSON encoding of the message, so two messages
//! with the same logical content sign identically regardless of how their maps
//! were built.
//!
//! Verification never errors out to the caller: [`verify`] and
//! [`verify_envelope`] return `false` for any malformed key, signature or
//! encoding. [`verify_detailed`] exposes the reason for logging.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::domain::canonical::to_canonical_vec;
use crate::domain::envelope::MessageEnvelope;
use crate::domain::identity::{AgentIdentity, PUBLIC_KEY_LENGTH};

/// Length in bytes of a detached Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("Invalid public key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("Invalid public key: {0}")]
    InvalidKey(String),
    #[error("Invalid signature encoding: {0}")]
    InvalidEncoding(String),
    #[error("Invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("Signature verification failed")]
    VerificationFailed,
}

/// An agent's DID together with its private signing key.
pub struct AgentKeypair {
    did: String,
    signing_key: SigningKey,
}

impl AgentKeypair {
    pub fn generate(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(did: impl Into<String>, seed: [u8; 32]) -> Self {
        Self {
            did: did.into(),
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key())
    }

    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity::new(self.did.clone(), self.public_key())
    }

    /// Base64 signature over the canonical encoding of `message`.
    pub fn sign_value(&self, message: &Value) -> String {
        let signature = self.signing_key.sign(&to_canonical_vec(message));
        STANDARD.encode(signature.to_bytes())
    }

    /// Stamp this agent as sender and sign the envelope.
    pub fn sign_envelope(&self, mut envelope: MessageEnvelope) -> MessageEnvelope {
        envelope.from_did = Some(self.did.clone());
        envelope.signature = None;
        let signature = self.signing_key.sign(&envelope.signing_bytes());
        envelope.signature = Some(STANDARD.encode(signature.to_bytes()));
        envelope
    }
}

impl fmt::Debug for AgentKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentKeypair")
            .field("did", &self.did)
            .field("public_key", &self.public_key_base64())
            .finish_non_exhaustive()
    }
}

/// Decode signature text: exactly 128 hex digits is hex, anything else base64.
pub fn decode_signature(signature: &str) -> Result<[u8; SIGNATURE_LENGTH], SigningError> {
    let trimmed = signature.trim();
    let bytes = if trimmed.len() == SIGNATURE_LENGTH * 2
        && trimmed.chars().all(|c| c.is_ascii_hexdigit())
    {
        hex::decode(trimmed).map_err(|e| SigningError::InvalidEncoding(e.to_string()))?
    } else {
        STANDARD
            .decode(trimmed)
            .map_err(|e| SigningError::InvalidEncoding(e.to_string()))?
    };
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| SigningError::InvalidSignatureLength(len))
}

pub fn decode_public_key(public_key: &[u8]) -> Result<VerifyingKey, SigningError> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = public_key
        .try_into()
        .map_err(|_| SigningError::InvalidKeyLength(public_key.len()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| SigningError::InvalidKey(e.to_string()))
}

/// Check `signature` over raw `message` bytes, reporting why it failed.
pub fn verify_detailed(
    message: &[u8],
    signature: &str,
    public_key: &[u8],
) -> Result<(), SigningError> {
    let verifying_key = decode_public_key(public_key)?;
    let sig_bytes = decode_signature(signature)?;
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message, &signature)
        .map_err(|_| SigningError::VerificationFailed)
}

/// Check `signature` over the canonical encoding of `message`.
pub fn verify(message: &Value, signature: &str, public_key: &[u8]) -> bool {
    verify_detailed(&to_canonical_vec(message), signature, public_key).is_ok()
}

/// Check an envelope's own signature against `public_key`.
pub fn verify_envelope(envelope: &MessageEnvelope, public_key: &[u8]) -> bool {
    match envelope.signature.as_deref() {
        Some(signature) => {
            verify_detailed(&envelope.signing_bytes(), signature, public_key).is_ok()
        }
        None => false,
    }
}

/// SHA-256 hex digest of the `|`-joined parts.
pub fn evidence_hash<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("|");
    hex::encode(Sha256::digest(joined.as_bytes()))
}
