// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use super::{target_of, OUTPUT_SUFFIX};
use crate::domain::agent::PipelineAgent;
use crate::domain::canonical::to_canonical_vec;
use crate::domain::consensus::FALLBACK_SCORE;
use crate::domain::envelope::current_timestamp;
use crate::domain::verdict::Vote;

pub const AGENT_NAME: &str = "zk_prover";

/// Mock proof stage.
///
/// Commits to every earlier stage output with a SHA-256 over their canonical
/// JSON and votes on the mean of the earlier risk scores. No real proof system
/// is involved: `proof_valid` is always `true` and `mock_mode` says so.
#[derive(Debug, Default, Clone)]
pub struct ZkProverAgent;

impl ZkProverAgent {
    pub fn new() -> Self {
        Self
    }
}

/// Earlier stage outputs keyed by stage name, in key order.
fn prior_outputs(input: &Value) -> Map<String, Value> {
    let mut outputs = Map::new();
    if let Some(object) = input.as_object() {
        for (key, value) in object {
            if let Some(stage) = key.strip_suffix(OUTPUT_SUFFIX) {
                outputs.insert(stage.to_string(), value.clone());
            }
        }
    }
    outputs
}

#[async_trait]
impl PipelineAgent for ZkProverAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    async fn process(&self, input: &Value) -> anyhow::Result<Value> {
        let target = target_of(input);
        let outputs = prior_outputs(input);

        let commitment = json!({ "outputs": outputs, "target": target });
        let proof_hash = hex::encode(Sha256::digest(to_canonical_vec(&commitment)));

        let scores: Vec<f64> = outputs
            .values()
            .filter_map(|o| o.get("risk_score").and_then(Value::as_f64))
            .collect();
        let risk_score = if scores.is_empty() {
            FALLBACK_SCORE
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        let vote = Vote::from_score(risk_score);

        info!(agent = AGENT_NAME, vote = %vote, risk_score, inputs = scores.len(), "Mock proof generated");

        Ok(json!({
            "agent": AGENT_NAME,
            "target": target,
            "vote": vote,
            "risk_score": risk_score,
            "proof_hash": proof_hash,
            "verification_key": format!("vk_{}", &proof_hash[..16]),
            "proof_valid": true,
            "mock_mode": true,
            "inputs": outputs.keys().collect::<Vec<_>>(),
            "evidence_hash": proof_hash,
            "timestamp": current_timestamp(),
        }))
    }
}
