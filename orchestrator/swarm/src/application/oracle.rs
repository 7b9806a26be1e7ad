// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Oracle Agent
//!
//! The `oracle` pipeline stage. Runs the specialist swarm over the target,
//! derives an oracle status from the fused findings and votes on the result.
//! It also answers signed `HIRE_REQUEST` envelopes from the sentinel with a
//! signed `HIRE_RESPONSE`.
//!
//! # Status rules (first match wins)
//!
//! | Status | Condition |
//! |--------|-----------|
//! | `MINORITY_FORK_DETECTED` | a finding mentions "fork" or "chain continuity" |
//! | `GOVERNANCE_RISK_DETECTED` | a finding mentions "governance" or "drep", and risk ≥ 0.5 |
//! | `NETWORK_RISK_DETECTED` | risk ≥ 0.6 |
//! | `CAUTION_ADVISED` | risk ≥ 0.3 |
//! | `SAFE_CHAIN` | otherwise |

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::application::coordinator::SpecialistCoordinator;
use sentinel_core::domain::agent::PipelineAgent;
use sentinel_core::domain::envelope::{current_timestamp, message_types, MessageEnvelope};
use sentinel_core::domain::specialist::AggregatedResult;
use sentinel_core::infrastructure::message_bus::MessageBus;
use sentinel_core::infrastructure::signing::{evidence_hash, AgentKeypair};

pub const AGENT_NAME: &str = "oracle";

const REASON_FINDINGS: usize = 3;
const RESPONSE_FINDINGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OracleStatus {
    SafeChain,
    CautionAdvised,
    NetworkRiskDetected,
    GovernanceRiskDetected,
    MinorityForkDetected,
}

impl OracleStatus {
    pub fn from_aggregate(aggregated: &AggregatedResult) -> Self {
        let text = aggregated.findings.join(" ").to_lowercase();
        let risk = aggregated.overall_risk;

        if text.contains("fork") || text.contains("chain continuity") {
            OracleStatus::MinorityForkDetected
        } else if (text.contains("governance") || text.contains("drep")) && risk >= 0.5 {
            OracleStatus::GovernanceRiskDetected
        } else if risk >= 0.6 {
            OracleStatus::NetworkRiskDetected
        } else if risk >= 0.3 {
            OracleStatus::CautionAdvised
        } else {
            OracleStatus::SafeChain
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OracleStatus::SafeChain => "SAFE_CHAIN",
            OracleStatus::CautionAdvised => "CAUTION_ADVISED",
            OracleStatus::NetworkRiskDetected => "NETWORK_RISK_DETECTED",
            OracleStatus::GovernanceRiskDetected => "GOVERNANCE_RISK_DETECTED",
            OracleStatus::MinorityForkDetected => "MINORITY_FORK_DETECTED",
        }
    }
}

impl fmt::Display for OracleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct OracleAgent {
    coordinator: Arc<SpecialistCoordinator>,
    keypair: AgentKeypair,
    bus: Option<Arc<MessageBus>>,
}

impl OracleAgent {
    pub fn new(coordinator: Arc<SpecialistCoordinator>, keypair: AgentKeypair) -> Self {
        Self {
            coordinator,
            keypair,
            bus: None,
        }
    }

    /// Publish a signed `ORACLE_VERDICT` on `bus` after every pipeline run.
    pub fn with_bus(mut self, bus: Arc<MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn did(&self) -> &str {
        self.keypair.did()
    }

    pub fn keypair(&self) -> &AgentKeypair {
        &self.keypair
    }

    /// Answer a sentinel's `HIRE_REQUEST` with a signed `HIRE_RESPONSE`.
    ///
    /// The request's signature is the bus's concern; this only checks the
    /// message type.
    pub async fn handle_hire_request(&self, request: &MessageEnvelope) -> anyhow::Result<MessageEnvelope> {
        if request.message_type != message_types::HIRE_REQUEST {
            anyhow::bail!(
                "expected {} envelope, got {}",
                message_types::HIRE_REQUEST,
                request.message_type
            );
        }

        let text = |key: &str| {
            request
                .payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let policy_id = text("policy_id");
        let escrow_id = text("escrow_id");
        let user_tip = request.payload.get("user_tip").cloned().unwrap_or(json!(0));
        let job_type = request
            .payload
            .get("job_type")
            .or_else(|| request.payload.get("scan_type"))
            .and_then(Value::as_str)
            .unwrap_or("fork_check")
            .to_string();
        info!(agent = AGENT_NAME, job_type = %job_type, from = ?request.sender(), "Hire request received");

        let context = json!({
            "user_tip": user_tip,
            "job_type": job_type,
            "escrow_id": escrow_id,
        });
        let aggregated = self.coordinator.run_all(&policy_id, &context).await;
        let status = OracleStatus::from_aggregate(&aggregated);

        let specialist_summary: Map<String, Value> = aggregated
            .per_unit_results
            .iter()
            .map(|(name, result)| {
                (
                    name.clone(),
                    json!({"risk": result.risk_score, "severity": result.severity}),
                )
            })
            .collect();
        let overall = aggregated.overall_risk.to_string();
        let evidence = evidence_hash(&[policy_id.as_str(), status.as_str(), overall.as_str()]);

        let mut payload = Map::new();
        payload.insert("status".into(), json!(status));
        payload.insert("mainnet_tip".into(), user_tip.clone());
        payload.insert("user_node_tip".into(), user_tip);
        payload.insert("risk_score".into(), json!(aggregated.overall_risk));
        payload.insert("verdict".into(), json!(aggregated.vote));
        payload.insert("reason".into(), json!(reason(&aggregated)));
        payload.insert("severity".into(), json!(aggregated.severity));
        payload.insert(
            "findings".into(),
            json!(aggregated.findings.iter().take(RESPONSE_FINDINGS).collect::<Vec<_>>()),
        );
        payload.insert("specialist_summary".into(), Value::Object(specialist_summary));
        payload.insert("confidence".into(), json!(aggregated.confidence));
        payload.insert("evidence".into(), json!(evidence));
        payload.insert("escrow_id".into(), json!(escrow_id));

        let mut response = MessageEnvelope::new(message_types::HIRE_RESPONSE, self.did(), payload);
        if let Some(requester) = request.sender() {
            response = response.with_recipient(requester);
        }
        info!(agent = AGENT_NAME, status = %status, "Returning hire response");
        Ok(self.keypair.sign_envelope(response))
    }

    async fn publish_verdict(&self, bus: &MessageBus, target: &str, output: &Value) -> bool {
        let mut payload = Map::new();
        payload.insert("target".into(), json!(target));
        for key in ["status", "vote", "risk_score", "evidence_hash"] {
            if let Some(value) = output.get(key) {
                payload.insert(key.to_string(), value.clone());
            }
        }
        let envelope = self.keypair.sign_envelope(MessageEnvelope::new(
            message_types::ORACLE_VERDICT,
            self.did(),
            payload,
        ));
        let accepted = bus.publish(&envelope).await;
        if !accepted {
            warn!(agent = AGENT_NAME, did = %self.did(), "Oracle verdict rejected by the bus");
        }
        accepted
    }
}

fn reason(aggregated: &AggregatedResult) -> String {
    if aggregated.findings.is_empty() {
        "No significant risks detected".to_string()
    } else {
        aggregated
            .findings
            .iter()
            .take(REASON_FINDINGS)
            .cloned()
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[async_trait]
impl PipelineAgent for OracleAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    async fn process(&self, input: &Value) -> anyhow::Result<Value> {
        let target = input.get("target").and_then(Value::as_str).unwrap_or_default();
        let context = input.get("context").cloned().unwrap_or(Value::Null);

        let aggregated = self.coordinator.run_all(target, &context).await;
        let status = OracleStatus::from_aggregate(&aggregated);
        let risk_score = aggregated.overall_risk * 100.0;
        let timestamp = current_timestamp();
        let evidence = evidence_hash(&[target, status.as_str(), aggregated.vote.as_str(), timestamp.as_str()]);
        info!(agent = AGENT_NAME, status = %status, vote = %aggregated.vote, risk_score, "Oracle verdict");

        let mut output = json!({
            "agent": AGENT_NAME,
            "target": target,
            "status": status,
            "vote": aggregated.vote,
            "risk_score": risk_score,
            "overall_risk": aggregated.overall_risk,
            "severity": aggregated.severity,
            "confidence": aggregated.confidence,
            "reason": reason(&aggregated),
            "findings": aggregated.findings,
            "specialist_results": aggregated.per_unit_results,
            "evidence_hash": evidence,
            "timestamp": timestamp,
        });

        if let Some(bus) = &self.bus {
            let published = self.publish_verdict(bus, target, &output).await;
            output["published"] = json!(published);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::domain::verdict::{Severity, Vote};
    use std::collections::BTreeMap;

    fn aggregate(risk: f64, findings: &[&str]) -> AggregatedResult {
        AggregatedResult {
            overall_risk: risk,
            severity: Severity::Low,
            vote: Vote::Safe,
            findings: findings.iter().map(|f| f.to_string()).collect(),
            per_unit_results: BTreeMap::new(),
            confidence: 1.0,
        }
    }

    #[test]
    fn test_fork_findings_win_regardless_of_risk() {
        let agg = aggregate(0.05, &["[BlockScanner] Minority Fork suspected"]);
        assert_eq!(OracleStatus::from_aggregate(&agg), OracleStatus::MinorityForkDetected);
        let agg = aggregate(0.0, &["[BlockScanner] chain continuity broken"]);
        assert_eq!(OracleStatus::from_aggregate(&agg), OracleStatus::MinorityForkDetected);
    }

    #[test]
    fn test_governance_needs_risk() {
        let findings = ["[VoteDoctor] DRep power concentrated"];
        assert_eq!(
            OracleStatus::from_aggregate(&aggregate(0.55, &findings)),
            OracleStatus::GovernanceRiskDetected
        );
        assert_eq!(
            OracleStatus::from_aggregate(&aggregate(0.35, &findings)),
            OracleStatus::CautionAdvised
        );
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(OracleStatus::from_aggregate(&aggregate(0.6, &[])), OracleStatus::NetworkRiskDetected);
        assert_eq!(OracleStatus::from_aggregate(&aggregate(0.3, &[])), OracleStatus::CautionAdvised);
        assert_eq!(OracleStatus::from_aggregate(&aggregate(0.29, &[])), OracleStatus::SafeChain);
    }

    #[test]
    fn test_reason_uses_first_three_findings() {
        let agg = aggregate(0.1, &["a", "b", "c", "d"]);
        assert_eq!(reason(&agg), "a; b; c");
        assert_eq!(reason(&aggregate(0.1, &[])), "No significant risks detected");
    }

    #[test]
    fn test_status_serialises_screaming_snake() {
        assert_eq!(json!(OracleStatus::SafeChain), json!("SAFE_CHAIN"));
        assert_eq!(OracleStatus::MinorityForkDetected.to_string(), "MINORITY_FORK_DETECTED");
    }
}
