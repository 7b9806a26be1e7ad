// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the weighted consensus engine.
//!
//! Covers the fixed scoring scenarios, quorum validation, settlement and
//! explainer degradation, and property tests for unanimity and monotonicity.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::Value;

use sentinel_core::application::consensus_engine::{evidence_root, ConsensusEngine};
use sentinel_core::domain::agent::{Explainer, SettlementSink};
use sentinel_core::domain::consensus::{AgentVote, ConsensusResult, ConsensusStatus};
use sentinel_core::domain::verdict::Vote;

fn vote(agent: &str, v: Vote, risk: f64, weight: f64) -> AgentVote {
    AgentVote::new(agent, v, risk, weight, format!("evidence-{}", agent))
}

fn required() -> Vec<String> {
    ["sentinel", "oracle", "compliance", "zk_prover"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

struct FailingSink;

#[async_trait]
impl SettlementSink for FailingSink {
    async fn submit(&self, _result: &ConsensusResult) -> anyhow::Result<String> {
        anyhow::bail!("settlement node unreachable")
    }
}

struct FailingExplainer;

#[async_trait]
impl Explainer for FailingExplainer {
    async fn explain(&self, _: Vote, _: f64, _: &str, _: &Value) -> anyhow::Result<Option<String>> {
        anyhow::bail!("model offline")
    }
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_mixed_ballot_lands_in_warning_band() {
    let votes = vec![
        vote("sentinel", Vote::Danger, 90.0, 0.40),
        vote("oracle", Vote::Safe, 10.0, 0.25),
        vote("compliance", Vote::Warning, 50.0, 0.20),
        vote("zk_prover", Vote::Safe, 5.0, 0.15),
    ];
    let outcome = ConsensusEngine::new().aggregate(votes, &required());

    assert_eq!(outcome.status, ConsensusStatus::Complete);
    // adjusted [95, 5, 50, 2.5]
    assert!((outcome.result.final_score - 49.625).abs() < 1e-9);
    assert_eq!(outcome.result.final_verdict, Vote::Warning);
    assert!((outcome.result.confidence - 0.20).abs() < 1e-9);
    assert!((outcome.result.weighted_breakdown["sentinel"] - 38.0).abs() < 1e-9);
}

#[test]
fn test_adjusted_scores_95_30_50_52_5_give_63_375() {
    let votes = vec![
        vote("sentinel", Vote::Danger, 90.0, 0.40),
        vote("oracle", Vote::Warning, 10.0, 0.25),
        vote("compliance", Vote::Warning, 50.0, 0.20),
        vote("zk_prover", Vote::Danger, 5.0, 0.15),
    ];
    let adjusted: Vec<f64> = votes.iter().map(AgentVote::adjusted_score).collect();
    assert_eq!(adjusted, vec![95.0, 30.0, 50.0, 52.5]);

    let outcome = ConsensusEngine::new().aggregate(votes, &required());
    assert!((outcome.result.final_score - 63.375).abs() < 1e-9);
    assert_eq!(outcome.result.final_verdict, Vote::Warning);
    assert!((outcome.result.confidence - 0.45).abs() < 1e-9);
}

#[test]
fn test_unanimous_danger() {
    let votes = vec![
        vote("sentinel", Vote::Danger, 100.0, 0.40),
        vote("oracle", Vote::Danger, 100.0, 0.25),
        vote("compliance", Vote::Danger, 100.0, 0.20),
        vote("zk_prover", Vote::Danger, 100.0, 0.15),
    ];
    let outcome = ConsensusEngine::new().aggregate(votes, &required());
    assert_eq!(outcome.result.final_score, 100.0);
    assert_eq!(outcome.result.final_verdict, Vote::Danger);
    assert_eq!(outcome.result.confidence, 1.0);
}

#[test]
fn test_band_edges() {
    let single = |risk: f64, v: Vote| {
        ConsensusEngine::new()
            .aggregate(vec![vote("solo", v, risk, 1.0)], &[])
            .result
    };
    // (0 + 80) / 2 = 40 → SAFE
    assert_eq!(single(80.0, Vote::Safe).final_verdict, Vote::Safe);
    // (50 + 90) / 2 = 70 → WARNING
    assert_eq!(single(90.0, Vote::Warning).final_verdict, Vote::Warning);
    // (100 + 42) / 2 = 71 → DANGER
    assert_eq!(single(42.0, Vote::Danger).final_verdict, Vote::Danger);
}

#[test]
fn test_score_between_warning_and_danger_bands_is_warning() {
    // (100 + 41) / 2 = 70.5
    let outcome = ConsensusEngine::new().aggregate(vec![vote("solo", Vote::Danger, 41.0, 1.0)], &[]);
    assert_eq!(outcome.status, ConsensusStatus::Complete);
    assert_eq!(outcome.result.final_score, 70.5);
    assert_eq!(outcome.result.final_verdict, Vote::Warning);
    assert_eq!(outcome.result.confidence, 0.0);
}

// ── Failure shapes ────────────────────────────────────────────────────────────

#[test]
fn test_missing_required_vote_is_failed_not_error() {
    let votes = vec![
        vote("sentinel", Vote::Danger, 100.0, 0.40),
        vote("oracle", Vote::Danger, 100.0, 0.25),
    ];
    let outcome = ConsensusEngine::new().aggregate(votes, &required());

    assert_eq!(outcome.status, ConsensusStatus::Failed);
    assert_eq!(outcome.result.final_verdict, Vote::Warning);
    assert_eq!(outcome.result.final_score, 50.0);
    assert_eq!(outcome.result.confidence, 0.0);
    assert_eq!(outcome.result.agent_votes.len(), 2);
    let error = outcome.error.unwrap();
    assert!(error.contains("compliance"));
    assert!(error.contains("zk_prover"));
}

#[test]
fn test_empty_and_weightless_ballots_fail() {
    let outcome = ConsensusEngine::new().aggregate(vec![], &[]);
    assert_eq!(outcome.status, ConsensusStatus::Failed);
    assert_eq!(outcome.evidence_root, evidence_root(&[]));

    let outcome = ConsensusEngine::new().aggregate(vec![vote("a", Vote::Safe, 0.0, 0.0)], &[]);
    assert_eq!(outcome.status, ConsensusStatus::Failed);
    assert_eq!(outcome.result.final_score, 50.0);
}

#[tokio::test]
async fn test_settlement_failure_leaves_verdict_unconfirmed() {
    let engine = ConsensusEngine::new()
        .with_settlement(Arc::new(FailingSink))
        .with_explainer(Arc::new(FailingExplainer));
    let outcome = engine
        .run(
            vec![vote("solo", Vote::Danger, 100.0, 1.0)],
            &[],
            "reason",
            &Value::Null,
        )
        .await;

    assert_eq!(outcome.status, ConsensusStatus::Complete);
    assert_eq!(outcome.result.final_verdict, Vote::Danger);
    let receipt = outcome.settlement.unwrap();
    assert!(!receipt.confirmed);
    assert!(receipt.reference.is_none());
    assert!(outcome.explanation.is_none());
}

#[tokio::test]
async fn test_failed_outcome_is_never_settled() {
    let engine = ConsensusEngine::new().with_settlement(Arc::new(FailingSink));
    let outcome = engine.run(vec![], &required(), "", &Value::Null).await;
    assert_eq!(outcome.status, ConsensusStatus::Failed);
    assert!(outcome.settlement.is_none());
}

// ── Properties ────────────────────────────────────────────────────────────────

fn any_vote() -> impl Strategy<Value = Vote> {
    prop_oneof![Just(Vote::Safe), Just(Vote::Warning), Just(Vote::Danger)]
}

fn ballot() -> impl Strategy<Value = Vec<(Vote, f64, f64)>> {
    prop::collection::vec((any_vote(), 0.0f64..=100.0, 0.01f64..1.0), 1..7)
}

fn build(ballot: &[(Vote, f64, f64)]) -> Vec<AgentVote> {
    ballot
        .iter()
        .enumerate()
        .map(|(i, (v, risk, weight))| vote(&format!("agent_{}", i), *v, *risk, *weight))
        .collect()
}

proptest! {
    #[test]
    fn prop_unanimous_danger_is_certain(weights in prop::collection::vec(0.01f64..1.0, 1..7)) {
        let total: f64 = weights.iter().sum();
        let votes: Vec<AgentVote> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| vote(&format!("agent_{}", i), Vote::Danger, 100.0, w / total))
            .collect();
        let outcome = ConsensusEngine::new().aggregate(votes, &[]);
        prop_assert_eq!(outcome.result.final_score, 100.0);
        prop_assert_eq!(outcome.result.final_verdict, Vote::Danger);
        prop_assert_eq!(outcome.result.confidence, 1.0);
    }

    #[test]
    fn prop_score_is_monotone_in_risk(
        ballot in ballot(),
        index in any::<prop::sample::Index>(),
        bump in 0.0f64..100.0,
    ) {
        let i = index.index(ballot.len());
        let base = build(&ballot);
        let mut raised = ballot.clone();
        raised[i].1 = (raised[i].1 + bump).min(100.0);

        let before = ConsensusEngine::new().aggregate(base, &[]).result.final_score;
        let after = ConsensusEngine::new().aggregate(build(&raised), &[]).result.final_score;
        prop_assert!(after >= before, "{} < {}", after, before);
    }

    #[test]
    fn prop_score_is_monotone_in_vote_severity(
        ballot in ballot(),
        index in any::<prop::sample::Index>(),
    ) {
        let i = index.index(ballot.len());
        let mut raised = ballot.clone();
        raised[i].0 = match raised[i].0 {
            Vote::Safe => Vote::Warning,
            Vote::Warning | Vote::Danger => Vote::Danger,
        };

        let before = ConsensusEngine::new().aggregate(build(&ballot), &[]).result.final_score;
        let after = ConsensusEngine::new().aggregate(build(&raised), &[]).result.final_score;
        prop_assert!(after >= before, "{} < {}", after, before);
    }

    #[test]
    fn prop_outcome_is_always_fully_formed(ballot in ballot()) {
        let outcome = ConsensusEngine::new().aggregate(build(&ballot), &required());
        prop_assert!(outcome.status.is_terminal());
        prop_assert!((0.0..=1.0).contains(&outcome.result.confidence));
        prop_assert!((0.0..=100.0).contains(&outcome.result.final_score));
        prop_assert_eq!(outcome.evidence_root.len(), 64);
    }
}
