// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Weighted risk fusion over specialist results.
//!
//! ```text
//! overall_risk = Σ(risk_i × weight_i) / Σ(weight_i)
//! severity     = max(severity_i)
//! confidence   = successful units / all units
//! ```
//!
//! Degraded results take part in the weighted mean at their unit's weight, so
//! a failed unit pulls the aggregate towards its placeholder rather than
//! vanishing from it.

use std::collections::BTreeMap;

use sentinel_core::domain::config::SpecialistConfig;
use sentinel_core::domain::specialist::{AggregatedResult, SpecialistResult};
use sentinel_core::domain::verdict::{Severity, Vote};

/// Risk assumed for a unit that reported a non-finite score.
const UNKNOWN_RISK: f64 = 0.5;

/// Fixed weights and vote thresholds applied by [`fuse`].
#[derive(Debug, Clone, PartialEq)]
pub struct FusionPolicy {
    pub weights: BTreeMap<String, f64>,
    pub default_weight: f64,
    pub warning_threshold: f64,
    pub danger_threshold: f64,
}

impl FusionPolicy {
    pub fn from_config(config: &SpecialistConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            default_weight: config.default_weight,
            warning_threshold: config.warning_threshold,
            danger_threshold: config.danger_threshold,
        }
    }

    pub fn weight_for(&self, unit: &str) -> f64 {
        self.weights.get(unit).copied().unwrap_or(self.default_weight)
    }

    pub fn vote_for(&self, risk: f64) -> Vote {
        Vote::from_risk(risk, self.warning_threshold, self.danger_threshold)
    }
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self::from_config(&SpecialistConfig::default())
    }
}

/// Fuse per-unit results, given in unit registration order.
///
/// Findings keep that order and are prefixed with `[<unit>]`. An empty input
/// or a zero total weight yields an overall risk of 0.0.
pub fn fuse(policy: &FusionPolicy, results: Vec<(String, SpecialistResult)>) -> AggregatedResult {
    let unit_count = results.len();
    let mut weighted_risk = 0.0;
    let mut total_weight = 0.0;
    let mut successful = 0usize;
    let mut severity = Severity::Low;
    let mut findings = Vec::new();
    let mut per_unit_results = BTreeMap::new();

    for (name, result) in results {
        let weight = policy.weight_for(&name).max(0.0);
        weighted_risk += sanitize_risk(result.risk_score) * weight;
        total_weight += weight;

        if result.success {
            successful += 1;
        }
        severity = severity.max(result.severity);
        findings.extend(result.findings.iter().map(|f| format!("[{}] {}", name, f)));
        per_unit_results.insert(name, result);
    }

    let overall_risk = if total_weight > 0.0 {
        (weighted_risk / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let confidence = if unit_count > 0 {
        successful as f64 / unit_count as f64
    } else {
        0.0
    };

    AggregatedResult {
        overall_risk,
        severity,
        vote: policy.vote_for(overall_risk),
        findings,
        per_unit_results,
        confidence,
    }
}

fn sanitize_risk(risk: f64) -> f64 {
    if risk.is_finite() {
        risk.clamp(0.0, 1.0)
    } else {
        UNKNOWN_RISK
    }
}
