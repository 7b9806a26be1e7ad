// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::agent::Explainer;
use crate::domain::verdict::Vote;

/// Deterministic one-sentence gloss, used when no language model is wired in.
#[derive(Debug, Default, Clone)]
pub struct TemplateExplainer;

#[async_trait]
impl Explainer for TemplateExplainer {
    async fn explain(
        &self,
        verdict: Vote,
        score: f64,
        reason: &str,
        _context: &Value,
    ) -> anyhow::Result<Option<String>> {
        let lead = match verdict {
            Vote::Safe => "No blocking risk was found",
            Vote::Warning => "Proceed with caution",
            Vote::Danger => "Do not proceed",
        };
        if reason.is_empty() {
            return Ok(Some(format!("{} (score {:.1}/100).", lead, score)));
        }
        Ok(Some(format!("{} (score {:.1}/100): {}.", lead, score, reason)))
    }
}
