// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Consensus Engine Application Service
//!
//! Fuses the per-agent votes of one analysis run into a final verdict.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Weighted vote aggregation, quorum validation, settlement hand-off
//! - **Dependencies:** Domain (Consensus, Agent traits), Infrastructure (Signing)
//!
//! # Run Lifecycle
//!
//! ```text
//! GATHERING_VOTES ─▶ CALCULATING_SCORE ─▶ SETTLING ─▶ COMPLETE
//!        │                   │
//!        └───────────────────┴──────────▶ FAILED (WARNING / 50 / 0.0)
//! ```
//!
//! A missing required vote, an empty ballot, a negative weight or a zero total
//! weight all end in FAILED. The caller always gets a fully formed
//! [`ConsensusOutcome`]; nothing here returns `Err`.
//!
//! Settlement and explanation run only after COMPLETE and can never change the
//! verdict: a failed settlement yields an unconfirmed receipt, a failed
//! explainer yields no explanation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::agent::{Explainer, SettlementSink};
use crate::domain::consensus::{
    AgentVote, ConsensusError, ConsensusOutcome, ConsensusResult, ConsensusStatus,
    SettlementReceipt, UNANIMITY_BONUS,
};
use crate::domain::verdict::Vote;
use crate::infrastructure::signing::evidence_hash;

/// Digest reported as the evidence root of an empty ballot.
pub const EMPTY_EVIDENCE_ROOT: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Default, Clone)]
pub struct ConsensusEngine {
    settlement: Option<Arc<dyn SettlementSink>>,
    explainer: Option<Arc<dyn Explainer>>,
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settlement(mut self, sink: Arc<dyn SettlementSink>) -> Self {
        self.settlement = Some(sink);
        self
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    /// Validate the ballot against the required quorum and score it.
    pub fn aggregate(&self, votes: Vec<AgentVote>, required_agents: &[String]) -> ConsensusOutcome {
        let root = evidence_root(&votes);
        debug!(status = ?ConsensusStatus::GatheringVotes, votes = votes.len(), "Consensus run started");

        let missing = missing_agents(&votes, required_agents);
        if !missing.is_empty() {
            return failed(votes, root, ConsensusError::MissingVotes(missing));
        }

        debug!(status = ?ConsensusStatus::CalculatingScore, "Scoring votes");
        match score(&votes) {
            Ok(mut result) => {
                result.agent_votes = votes;
                info!(
                    final_score = result.final_score,
                    verdict = %result.final_verdict,
                    confidence = result.confidence,
                    "Consensus reached"
                );
                ConsensusOutcome {
                    status: ConsensusStatus::Complete,
                    result,
                    error: None,
                    evidence_root: root,
                    settlement: None,
                    explanation: None,
                }
            }
            Err(e) => failed(votes, root, e),
        }
    }

    /// Attach the settlement receipt and explanation to a completed outcome.
    pub async fn finalize(
        &self,
        mut outcome: ConsensusOutcome,
        reason: &str,
        context: &Value,
    ) -> ConsensusOutcome {
        if !outcome.is_complete() {
            return outcome;
        }

        if let Some(sink) = &self.settlement {
            debug!(status = ?ConsensusStatus::Settling, "Submitting consensus result");
            let receipt = match sink.submit(&outcome.result).await {
                Ok(reference) => SettlementReceipt::confirmed(reference),
                Err(e) => {
                    warn!(error = %e, "Settlement failed; result left unconfirmed");
                    SettlementReceipt::unconfirmed()
                }
            };
            outcome.settlement = Some(receipt);
        }

        if let Some(explainer) = &self.explainer {
            let result = &outcome.result;
            outcome.explanation = match explainer
                .explain(result.final_verdict, result.final_score, reason, context)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Explainer failed; omitting explanation");
                    None
                }
            };
        }

        outcome
    }

    /// [`aggregate`](Self::aggregate) followed by [`finalize`](Self::finalize).
    pub async fn run(
        &self,
        votes: Vec<AgentVote>,
        required_agents: &[String],
        reason: &str,
        context: &Value,
    ) -> ConsensusOutcome {
        let outcome = self.aggregate(votes, required_agents);
        self.finalize(outcome, reason, context).await
    }
}

/// Weighted blend of the ballot. `agent_votes` is left empty for the caller to fill.
pub fn score(votes: &[AgentVote]) -> Result<ConsensusResult, ConsensusError> {
    if votes.is_empty() {
        return Err(ConsensusError::NoVotes);
    }
    if let Some(bad) = votes.iter().find(|v| v.weight < 0.0 || v.weight.is_nan()) {
        return Err(ConsensusError::NegativeWeight {
            agent: bad.agent_name.clone(),
            weight: bad.weight,
        });
    }

    let total_weight: f64 = votes.iter().map(|v| v.weight).sum();
    if total_weight <= 0.0 {
        return Err(ConsensusError::ZeroTotalWeight);
    }

    let mut weighted_breakdown = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut lowest = f64::INFINITY;
    let mut highest = f64::NEG_INFINITY;
    for vote in votes {
        let adjusted = vote.adjusted_score();
        let contribution = adjusted * vote.weight;
        *weighted_breakdown
            .entry(vote.agent_name.clone())
            .or_insert(0.0) += contribution;
        weighted_sum += contribution;
        lowest = lowest.min(adjusted);
        highest = highest.max(adjusted);
    }

    // A weighted mean lies within its inputs; clamp away rounding drift.
    let final_score = (weighted_sum / total_weight).max(lowest).min(highest);
    let final_verdict = Vote::from_score(final_score);

    let agreeing_weight: f64 = votes
        .iter()
        .filter(|v| v.vote == final_verdict)
        .map(|v| v.weight)
        .sum();
    let mut confidence = agreeing_weight / total_weight;
    if votes.iter().all(|v| v.vote == final_verdict) {
        confidence *= UNANIMITY_BONUS;
    }
    let confidence = confidence.clamp(0.0, 1.0);

    Ok(ConsensusResult {
        final_score,
        final_verdict,
        agent_votes: Vec::new(),
        weighted_breakdown,
        confidence,
    })
}

/// SHA-256 over the `|`-joined evidence hashes, in ballot order.
pub fn evidence_root(votes: &[AgentVote]) -> String {
    if votes.is_empty() {
        return EMPTY_EVIDENCE_ROOT.to_string();
    }
    let hashes: Vec<&str> = votes.iter().map(|v| v.evidence_hash.as_str()).collect();
    evidence_hash(&hashes)
}

fn missing_agents(votes: &[AgentVote], required_agents: &[String]) -> Vec<String> {
    let mut missing: Vec<String> = required_agents
        .iter()
        .filter(|required| !votes.iter().any(|v| &v.agent_name == *required))
        .cloned()
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

fn failed(votes: Vec<AgentVote>, evidence_root: String, error: ConsensusError) -> ConsensusOutcome {
    warn!(error = %error, status = ?ConsensusStatus::Failed, "Consensus failed");
    ConsensusOutcome {
        status: ConsensusStatus::Failed,
        result: ConsensusResult::fallback(votes),
        error: Some(error.to_string()),
        evidence_root,
        settlement: None,
        explanation: None,
    }
}
