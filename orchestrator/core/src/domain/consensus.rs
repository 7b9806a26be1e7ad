// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Weighted Consensus Domain
//!
//! Types for the terminal stage of an analysis run: every pipeline agent casts
//! an [`AgentVote`], the consensus engine blends them into a
//! [`ConsensusResult`] and wraps it in a [`ConsensusOutcome`] that also carries
//! the run status, the evidence root and the optional settlement receipt.
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | `AgentVote` | Categorical vote + 0–100 risk + fixed cross-agent weight |
//! | `ConsensusResult` | Final score, verdict, breakdown and confidence |
//! | `ConsensusStatus` | `GATHERING_VOTES → CALCULATING_SCORE → SETTLING → COMPLETE`, or `FAILED` |
//! | `ConsensusOutcome` | What the engine returns; never absent, even on failure |
//!
//! ## Scoring
//!
//! Each vote is first blended with its own numeric score:
//! `adjusted = (vote.numeric() + risk_score) / 2`. The final score is the
//! weight-normalised mean of the adjusted scores. A failed run still reports
//! the deterministic fallback `WARNING / 50 / 0.0`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::verdict::Vote;

/// Score reported by a failed consensus run.
pub const FALLBACK_SCORE: f64 = 50.0;

/// Confidence multiplier applied when every agent voted the final verdict.
pub const UNANIMITY_BONUS: f64 = 1.2;

/// One agent's contribution to a consensus run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVote {
    pub agent_name: String,
    pub vote: Vote,
    /// 0 – 100.
    pub risk_score: f64,
    pub weight: f64,
    /// Hex digest binding this vote to the evidence it was derived from.
    pub evidence_hash: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentVote {
    pub fn new(
        agent_name: impl Into<String>,
        vote: Vote,
        risk_score: f64,
        weight: f64,
        evidence_hash: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            vote,
            risk_score,
            weight,
            evidence_hash: evidence_hash.into(),
            timestamp: Utc::now(),
        }
    }

    /// Categorical vote blended with the agent's own numeric score.
    pub fn adjusted_score(&self) -> f64 {
        (self.vote.numeric() + self.risk_score) / 2.0
    }
}

/// Immutable product of one consensus run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub final_score: f64,
    pub final_verdict: Vote,
    pub agent_votes: Vec<AgentVote>,
    /// agent name → `adjusted_score × weight`
    pub weighted_breakdown: BTreeMap<String, f64>,
    pub confidence: f64,
}

impl ConsensusResult {
    /// Deterministic result reported by a failed run.
    pub fn fallback(agent_votes: Vec<AgentVote>) -> Self {
        Self {
            final_score: FALLBACK_SCORE,
            final_verdict: Vote::Warning,
            agent_votes,
            weighted_breakdown: BTreeMap::new(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsensusStatus {
    GatheringVotes,
    CalculatingScore,
    Settling,
    Complete,
    Failed,
}

impl ConsensusStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConsensusStatus::Complete | ConsensusStatus::Failed)
    }
}

/// Reference returned by the settlement sink, or its absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub reference: Option<String>,
    pub confirmed: bool,
}

impl SettlementReceipt {
    pub fn confirmed(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            confirmed: true,
        }
    }

    pub fn unconfirmed() -> Self {
        Self {
            reference: None,
            confirmed: false,
        }
    }
}

/// Everything a consensus run reports. Always fully formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    pub status: ConsensusStatus,
    pub result: ConsensusResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// SHA-256 over the `|`-joined evidence hashes of every vote.
    pub evidence_root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementReceipt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ConsensusOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == ConsensusStatus::Complete
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsensusError {
    #[error("Missing votes from required agents: {}", .0.join(", "))]
    MissingVotes(Vec<String>),
    #[error("No votes were cast")]
    NoVotes,
    #[error("Agent '{agent}' has negative weight {weight}")]
    NegativeWeight { agent: String, weight: f64 },
    #[error("Total vote weight is zero")]
    ZeroTotalWeight,
}
