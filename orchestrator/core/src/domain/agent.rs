// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pipeline Agents and External Collaborators
//!
//! [`PipelineAgent`] is the one seam the workflow orchestrator drives. The other
//! traits here are the opaque outside world the agents lean on:
//!
//! | Trait | Consumed by | Failure policy |
//! |-------|-------------|----------------|
//! | [`Explainer`] | consensus agent | omitted gloss, verdict untouched |
//! | [`SettlementSink`] | consensus agent | receipt marked unconfirmed |
//! | [`WalletDataSource`] | compliance agent | neutral behaviour score |
//! | [`SanctionsList`] | compliance agent | infallible lookup |
//!
//! Implementations live in `infrastructure`; tests supply their own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::consensus::ConsensusResult;
use crate::domain::verdict::Vote;

/// One stage of the analysis pipeline.
///
/// `input` is `{"target", "context", "<earlier agent>_output": ...}`; the
/// returned value becomes `<name>_output` for every later stage.
#[async_trait]
pub trait PipelineAgent: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, input: &Value) -> anyhow::Result<Value>;
}

/// Optional natural-language gloss over a finished verdict.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(
        &self,
        verdict: Vote,
        score: f64,
        reason: &str,
        context: &Value,
    ) -> anyhow::Result<Option<String>>;
}

/// External ledger write for a completed consensus result.
#[async_trait]
pub trait SettlementSink: Send + Sync {
    /// Returns the external reference of the write.
    async fn submit(&self, result: &ConsensusResult) -> anyhow::Result<String>;
}

/// A single transfer in a wallet's history. Amounts are in lovelace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub amount: u64,
    #[serde(default)]
    pub direction: Option<String>,
}

/// On-chain facts about a wallet as reported by an indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletFacts {
    pub address: String,
    #[serde(default)]
    pub tx_count: u64,
    #[serde(default)]
    pub first_tx_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tx_history: Vec<WalletTransaction>,
}

#[async_trait]
pub trait WalletDataSource: Send + Sync {
    async fn fetch(&self, address: &str) -> anyhow::Result<WalletFacts>;
}

/// A positive sanctions-list match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionsHit {
    pub list: String,
    pub reason: String,
}

#[async_trait]
pub trait SanctionsList: Send + Sync {
    async fn screen(&self, address: &str) -> Option<SanctionsHit>;

    /// Names of the lists consulted, reported alongside a clean result.
    fn lists_checked(&self) -> Vec<String>;
}
