// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Sentinel Agent - protocol compliance gate
//
// First stage of the pipeline. Rejects targets that are not well-formed
// policy ids (56 or 64 hex digits), match a known scam prefix, or carry a
// malformed transaction CBOR. Any failure is a DANGER vote at 100; a clean
// target is SAFE at 20.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::{context_of, target_of};
use crate::domain::agent::PipelineAgent;
use crate::domain::envelope::{current_timestamp, message_types, MessageEnvelope};
use crate::domain::verdict::Vote;
use crate::infrastructure::signing::{evidence_hash, AgentKeypair};

pub const AGENT_NAME: &str = "sentinel";

const VALID_LENGTHS: [usize; 2] = [56, 64];
const BLOCKED_PREFIXES: [&str; 3] = ["dead", "scam", "fake"];

const VIOLATION_RISK: f64 = 100.0;
const CLEAN_RISK: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub check: String,
    pub passed: bool,
}

/// Outcome of the structural checks on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolReport {
    pub checks: Vec<ComplianceCheck>,
    pub failures: Vec<String>,
}

impl ProtocolReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Structural checks on a policy id and an optional transaction CBOR.
pub fn check_protocol(target: &str, tx_cbor: Option<&str>) -> ProtocolReport {
    let mut checks = Vec::new();
    let mut failures = Vec::new();
    let tx_cbor = tx_cbor.filter(|c| !c.is_empty());

    if !target.is_empty() {
        let is_hex = target.chars().all(|c| c.is_ascii_hexdigit());
        let is_valid_length = VALID_LENGTHS.contains(&target.len());
        checks.push(ComplianceCheck {
            check: "policy_id_format".to_string(),
            passed: is_hex && is_valid_length,
        });
        if !is_hex {
            failures.push("Policy ID contains invalid hex characters".to_string());
        }
        if !is_valid_length {
            failures.push("Policy ID has invalid length".to_string());
        }
    }

    if let Some(cbor) = tx_cbor {
        let is_valid = cbor.len() % 2 == 0 && cbor.chars().all(|c| c.is_ascii_hexdigit());
        checks.push(ComplianceCheck {
            check: "cbor_format".to_string(),
            passed: is_valid,
        });
        if !is_valid {
            failures.push("Transaction CBOR format invalid".to_string());
        }
    }

    if !target.is_empty() {
        let lowered = target.to_ascii_lowercase();
        let blocked = BLOCKED_PREFIXES.iter().any(|p| lowered.starts_with(p));
        checks.push(ComplianceCheck {
            check: "blacklist".to_string(),
            passed: !blocked,
        });
        if blocked {
            failures.push("Policy ID matches known scam pattern".to_string());
        }
    }

    if target.is_empty() && tx_cbor.is_none() {
        failures.push("No policy_id or tx_cbor provided".to_string());
    }

    ProtocolReport { checks, failures }
}

/// Signed request asking an Oracle to run its network checks on `target`.
pub fn hire_request(
    keypair: &AgentKeypair,
    oracle_did: &str,
    target: &str,
    user_tip: u64,
) -> MessageEnvelope {
    let mut payload = Map::new();
    payload.insert("policy_id".to_string(), Value::String(target.to_string()));
    payload.insert("user_tip".to_string(), json!(user_tip));
    payload.insert("scan_type".to_string(), Value::String("fork_check".to_string()));
    keypair.sign_envelope(
        MessageEnvelope::new(message_types::HIRE_REQUEST, keypair.did(), payload)
            .with_recipient(oracle_did),
    )
}

#[derive(Debug, Default, Clone)]
pub struct SentinelAgent;

impl SentinelAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineAgent for SentinelAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    async fn process(&self, input: &Value) -> anyhow::Result<Value> {
        let target = target_of(input);
        let tx_cbor = context_of(input).get("tx_cbor").and_then(Value::as_str);
        let report = check_protocol(target, tx_cbor);

        let (vote, risk_score, reason) = match report.failures.first() {
            Some(first) => {
                warn!(agent = AGENT_NAME, reason = %first, "Protocol compliance failed");
                (Vote::Danger, VIOLATION_RISK, format!("Protocol violation: {}", first))
            }
            None => (Vote::Safe, CLEAN_RISK, "Protocol compliance passed".to_string()),
        };

        let timestamp = current_timestamp();
        let evidence = evidence_hash(&[
            target,
            vote.as_str(),
            risk_score.to_string().as_str(),
            timestamp.as_str(),
        ]);
        info!(agent = AGENT_NAME, vote = %vote, risk_score, "Sentinel verdict");

        Ok(json!({
            "agent": AGENT_NAME,
            "target": target,
            "vote": vote,
            "risk_score": risk_score,
            "reason": reason,
            "checks": report.checks,
            "failures": report.failures,
            "evidence_hash": evidence,
            "timestamp": timestamp,
        }))
    }
}
