// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Message Envelope
//!
//! The signed unit exchanged between agents over the message bus.
//!
//! ## Wire Format
//!
//! ```json
//! {
//!   "protocol": "IACP/2.0",
//!   "type": "HIRE_REQUEST",
//!   "from_did": "did:masumi:sentinel_01",
//!   "to_did": "did:masumi:oracle_01",
//!   "payload": { "...": "..." },
//!   "timestamp": "2026-01-01T00:00:00Z",
//!   "signature": "<base64 or hex Ed25519 signature>"
//! }
//! ```
//!
//! ## Invariants
//!
//! - The signature covers the canonical JSON (see [`crate::domain::canonical`])
//!   of every field except `signature`. Absent optional fields are omitted,
//!   never written as `null`.
//! - An envelope is signed once and never mutated afterwards; the bus verifies
//!   it exactly once and then either broadcasts it or drops it.
//! - The payload is opaque to the bus.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::canonical::to_canonical_vec;

/// Protocol tag stamped on every envelope.
pub const PROTOCOL_VERSION: &str = "IACP/2.0";

/// Second-precision UTC timestamp format used on the wire.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Well-known message kinds.
pub mod message_types {
    pub const HIRE_REQUEST: &str = "HIRE_REQUEST";
    pub const HIRE_RESPONSE: &str = "HIRE_RESPONSE";
    pub const ORACLE_VERDICT: &str = "ORACLE_VERDICT";
    pub const CONSENSUS_RESULT: &str = "CONSENSUS_RESULT";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub protocol: String,

    #[serde(rename = "type")]
    pub message_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_did: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_did: Option<String>,

    #[serde(default)]
    pub payload: Map<String, Value>,

    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl MessageEnvelope {
    /// Build an unsigned envelope stamped with the current UTC second.
    pub fn new(
        message_type: impl Into<String>,
        from_did: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            protocol: PROTOCOL_VERSION.to_string(),
            message_type: message_type.into(),
            from_did: Some(from_did.into()),
            to_did: None,
            payload,
            timestamp: current_timestamp(),
            signature: None,
        }
    }

    pub fn with_recipient(mut self, to_did: impl Into<String>) -> Self {
        self.to_did = Some(to_did.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// The envelope as a JSON value with the `signature` field removed.
    ///
    /// This is the exact value whose canonical encoding is signed.
    pub fn unsigned_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("protocol".to_string(), Value::String(self.protocol.clone()));
        object.insert("type".to_string(), Value::String(self.message_type.clone()));
        if let Some(from) = &self.from_did {
            object.insert("from_did".to_string(), Value::String(from.clone()));
        }
        if let Some(to) = &self.to_did {
            object.insert("to_did".to_string(), Value::String(to.clone()));
        }
        object.insert("payload".to_string(), Value::Object(self.payload.clone()));
        object.insert("timestamp".to_string(), Value::String(self.timestamp.clone()));
        Value::Object(object)
    }

    /// Canonical bytes covered by the signature.
    pub fn signing_bytes(&self) -> Vec<u8> {
        to_canonical_vec(&self.unsigned_value())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Sender DID, treating an empty string the same as an absent field.
    pub fn sender(&self) -> Option<&str> {
        self.from_did.as_deref().filter(|did| !did.is_empty())
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Current UTC time at second precision in wire format.
pub fn current_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}
