// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::agent::SettlementSink;
use crate::domain::consensus::ConsensusResult;

/// Settlement sink that never leaves the process.
///
/// The reference is derived from the score and verdict so repeated runs over
/// the same result produce the same id.
#[derive(Debug, Default, Clone)]
pub struct MockSettlementSink;

impl MockSettlementSink {
    pub fn reference_for(result: &ConsensusResult) -> String {
        let digest = Sha256::digest(
            format!("{}|{}", result.final_score, result.final_verdict).as_bytes(),
        );
        format!("l2_tx_{}", &hex::encode(digest)[..16])
    }
}

#[async_trait]
impl SettlementSink for MockSettlementSink {
    async fn submit(&self, result: &ConsensusResult) -> anyhow::Result<String> {
        let reference = Self::reference_for(result);
        info!(reference = %reference, verdict = %result.final_verdict, "Settled consensus result (mock)");
        Ok(reference)
    }
}
