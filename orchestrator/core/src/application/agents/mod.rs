// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pipeline agents shipped with the core.
//!
//! | Stage | Agent | Vote basis |
//! |-------|-------|------------|
//! | `sentinel` | [`SentinelAgent`] | protocol compliance of the target |
//! | `compliance` | [`ComplianceAgent`] | sanctions screening and wallet behaviour |
//! | `zk_prover` | [`ZkProverAgent`] | mean of earlier risk scores (mock proof) |
//! | `consensus` | [`ConsensusAgent`] | weighted fusion of every earlier vote |
//!
//! The `oracle` stage lives in the swarm crate because it fans out to
//! specialists.

pub mod compliance;
pub mod consensus;
pub mod sentinel;
pub mod zk_prover;

pub use compliance::ComplianceAgent;
pub use consensus::ConsensusAgent;
pub use sentinel::SentinelAgent;
pub use zk_prover::ZkProverAgent;

use serde_json::Value;

/// Suffix under which the workflow stores each stage's output.
pub const OUTPUT_SUFFIX: &str = "_output";

pub(crate) fn target_of(input: &Value) -> &str {
    input.get("target").and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn context_of(input: &Value) -> &Value {
    input.get("context").unwrap_or(&Value::Null)
}
