// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Consensus Agent - terminal pipeline stage
//
// Turns every earlier stage output into an AgentVote, hands the ballot to the
// ConsensusEngine and reports the outcome. A vote text that does not parse
// counts as WARNING; an agent without a configured weight gets the default.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{context_of, OUTPUT_SUFFIX};
use crate::application::consensus_engine::ConsensusEngine;
use crate::domain::agent::PipelineAgent;
use crate::domain::config::ConsensusConfig;
use crate::domain::consensus::AgentVote;
use crate::domain::envelope::current_timestamp;
use crate::domain::verdict::Vote;
use crate::infrastructure::signing::evidence_hash;

pub const AGENT_NAME: &str = "consensus";

pub struct ConsensusAgent {
    engine: ConsensusEngine,
    config: ConsensusConfig,
}

impl ConsensusAgent {
    pub fn new(engine: ConsensusEngine, config: ConsensusConfig) -> Self {
        Self { engine, config }
    }

    /// Ballot built from the `<stage>_output` entries of a stage input.
    pub fn collect_votes(&self, input: &Value) -> Vec<AgentVote> {
        let Some(object) = input.as_object() else {
            return Vec::new();
        };
        object
            .iter()
            .filter_map(|(key, output)| {
                let stage = key.strip_suffix(OUTPUT_SUFFIX)?;
                if stage == AGENT_NAME {
                    return None;
                }
                Some(self.vote_from_output(stage, output))
            })
            .collect()
    }

    fn vote_from_output(&self, stage: &str, output: &Value) -> AgentVote {
        let agent = output
            .get("agent")
            .and_then(Value::as_str)
            .unwrap_or(stage)
            .to_string();
        let vote = match output.get("vote").and_then(Value::as_str) {
            Some(text) => text.parse().unwrap_or_else(|_| {
                warn!(agent = %agent, vote = %text, "Unrecognised vote, counting as WARNING");
                Vote::Warning
            }),
            None => Vote::Warning,
        };
        let risk_score = output
            .get("risk_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let evidence = output
            .get("evidence_hash")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let weight = self.config.weight_for(&agent);
        debug!(agent = %agent, vote = %vote, risk_score, weight, "Collected vote");
        AgentVote::new(agent, vote, risk_score, weight, evidence)
    }
}

/// Reason text of the first stage that voted the final verdict.
fn agreeing_reason(input: &Value, verdict: Vote) -> String {
    input
        .as_object()
        .into_iter()
        .flat_map(|object| object.iter())
        .filter(|(key, _)| key.ends_with(OUTPUT_SUFFIX))
        .find_map(|(_, output)| {
            let vote: Vote = output.get("vote")?.as_str()?.parse().ok()?;
            if vote != verdict {
                return None;
            }
            output.get("reason")?.as_str().map(str::to_string)
        })
        .unwrap_or_default()
}

#[async_trait]
impl PipelineAgent for ConsensusAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    async fn process(&self, input: &Value) -> anyhow::Result<Value> {
        let votes = self.collect_votes(input);
        let outcome = self
            .engine
            .aggregate(votes, &self.config.required_agents);
        let reason = agreeing_reason(input, outcome.result.final_verdict);
        let outcome = self
            .engine
            .finalize(outcome, &reason, context_of(input))
            .await;

        let result = &outcome.result;
        let timestamp = current_timestamp();
        let evidence = evidence_hash(&[
            outcome.evidence_root.as_str(),
            result.final_score.to_string().as_str(),
            result.final_verdict.as_str(),
            timestamp.as_str(),
        ]);

        let mut output = serde_json::to_value(&outcome)?;
        if let Some(object) = output.as_object_mut() {
            object.insert("agent".to_string(), json!(AGENT_NAME));
            object.insert("vote".to_string(), json!(result.final_verdict));
            object.insert("risk_score".to_string(), json!(result.final_score));
            object.insert("final_verdict".to_string(), json!(result.final_verdict));
            object.insert("final_score".to_string(), json!(result.final_score));
            object.insert("confidence".to_string(), json!(result.confidence));
            object.insert("evidence_hash".to_string(), json!(evidence));
            object.insert("timestamp".to_string(), json!(timestamp));
        }
        Ok(output)
    }
}
