// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of an Ed25519 verification key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Public identity of one running agent: its DID and Ed25519 verification key.
///
/// Created once at agent start-up from the agent's keypair and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub did: String,
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl AgentIdentity {
    pub fn new(did: impl Into<String>, public_key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self {
            did: did.into(),
            public_key,
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)
    }
}
