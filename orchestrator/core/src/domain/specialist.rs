// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Specialist Domain
//!
//! A **specialist** is one independent risk-scanning check that the Oracle runs
//! in parallel with its siblings against the same target. Each returns a
//! [`SpecialistResult`]; the coordinator fuses them into an [`AggregatedResult`].
//!
//! | Type | Lifetime |
//! |------|----------|
//! | [`SpecialistResult`] | one per unit invocation, discarded after fusion |
//! | [`AggregatedResult`] | rebuilt on every coordinator run |
//!
//! The [`Specialist`] trait is the data-source seam: implementations may hit a
//! ledger indexer, a DEX API, or return canned data. The core only needs a
//! risk score, a severity and findings back, or an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::verdict::{Severity, Vote};

/// Outcome of one specialist check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistResult {
    /// 0.0 (benign) – 1.0 (dangerous).
    pub risk_score: f64,
    pub severity: Severity,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// `false` when the unit could not complete its check.
    pub success: bool,
}

impl SpecialistResult {
    pub fn new(risk_score: f64, severity: Severity) -> Self {
        Self {
            risk_score,
            severity,
            findings: Vec::new(),
            metadata: Map::new(),
            success: true,
        }
    }

    pub fn with_finding(mut self, finding: impl Into<String>) -> Self {
        self.findings.push(finding.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Degraded result recorded for a unit that failed or timed out.
    pub fn degraded(risk_score: f64, finding: impl Into<String>, marker: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert(marker.to_string(), Value::Bool(true));
        Self {
            risk_score,
            severity: Severity::Low,
            findings: vec![finding.into()],
            metadata,
            success: false,
        }
    }
}

/// Fused view over every specialist that reported for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Weighted mean risk, 0.0 – 1.0.
    pub overall_risk: f64,
    /// Highest severity among contributing results.
    pub severity: Severity,
    pub vote: Vote,
    /// Every unit's findings, each prefixed with `[<unit name>]`.
    pub findings: Vec<String>,
    pub per_unit_results: BTreeMap<String, SpecialistResult>,
    /// Fraction of units that reported `success = true`.
    pub confidence: f64,
}

/// One parallel risk-scanning unit.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Stable unit name, used as the fusion weight key.
    fn name(&self) -> &str;

    async fn scan(&self, target: &str, context: &Value) -> anyhow::Result<SpecialistResult>;
}
