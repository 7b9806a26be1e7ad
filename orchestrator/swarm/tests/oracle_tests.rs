// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the Oracle agent.
//!
//! Covers the pipeline stage output, verdict publication over the signed
//! message bus, the hire-request / hire-response exchange with the sentinel,
//! and full five-stage pipeline runs with the oracle in place.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};

use sentinel_core::application::agents::sentinel::hire_request;
use sentinel_core::application::pipeline::{standard_pipeline, PipelineDependencies};
use sentinel_core::domain::agent::{PipelineAgent, SanctionsHit, WalletFacts};
use sentinel_core::domain::config::{OrchestratorConfig, SpecialistConfig};
use sentinel_core::domain::envelope::message_types;
use sentinel_core::domain::specialist::{Specialist, SpecialistResult};
use sentinel_core::domain::verdict::{Severity, Vote};
use sentinel_core::domain::workflow::WorkflowStatus;
use sentinel_core::infrastructure::message_bus::{ChannelSink, MessageBus};
use sentinel_core::infrastructure::signing::{verify_envelope, AgentKeypair};
use sentinel_core::infrastructure::wallet::{StaticSanctionsList, StaticWalletSource};
use sentinel_swarm::{OracleAgent, SpecialistCoordinator, StaticSpecialist};

const VALID_POLICY: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c";
const ORACLE_DID: &str = "did:masumi:oracle_01";
const SENTINEL_DID: &str = "did:masumi:sentinel_01";

fn unit(name: &str, risk: f64, severity: Severity, finding: &str) -> Arc<dyn Specialist> {
    Arc::new(StaticSpecialist::new(
        name,
        SpecialistResult::new(risk, severity).with_finding(finding),
    ))
}

fn clean_swarm() -> Vec<Arc<dyn Specialist>> {
    vec![
        unit("BlockScanner", 0.05, Severity::Low, "Tip in sync with mainnet"),
        unit("StakeAnalyzer", 0.10, Severity::Low, "Stake well distributed"),
        unit("VoteDoctor", 0.05, Severity::Low, "No governance anomalies"),
        unit("MempoolSniffer", 0.10, Severity::Low, "Mempool quiet"),
        unit("ReplayDetector", 0.0, Severity::Low, "No replayed transactions"),
    ]
}

fn forked_swarm() -> Vec<Arc<dyn Specialist>> {
    vec![
        unit("BlockScanner", 0.95, Severity::Critical, "Minority fork detected at tip"),
        unit("StakeAnalyzer", 0.80, Severity::High, "Stake concentrated in 3 pools"),
        unit("VoteDoctor", 0.80, Severity::High, "DRep power concentrated"),
        unit("MempoolSniffer", 0.80, Severity::Medium, "Sandwich pattern"),
        unit("ReplayDetector", 0.80, Severity::High, "Replayed tx observed"),
    ]
}

fn oracle(units: Vec<Arc<dyn Specialist>>) -> OracleAgent {
    let coordinator = SpecialistCoordinator::new(units, &SpecialistConfig::default()).unwrap();
    OracleAgent::new(
        Arc::new(coordinator),
        AgentKeypair::from_seed(ORACLE_DID, [11; 32]),
    )
}

fn established_wallet() -> WalletFacts {
    WalletFacts {
        address: "addr1_any".to_string(),
        tx_count: 300,
        first_tx_date: Some(Utc::now() - chrono::Duration::days(500)),
        tx_history: Vec::new(),
    }
}

// ── Pipeline stage ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_process_reports_status_vote_and_percent_risk() {
    let agent = oracle(forked_swarm());
    let output = agent
        .process(&json!({"target": VALID_POLICY, "context": {}}))
        .await
        .unwrap();

    assert_eq!(output["agent"], "oracle");
    assert_eq!(output["status"], "MINORITY_FORK_DETECTED");
    assert_eq!(output["vote"], "DANGER");
    assert_eq!(output["severity"], "critical");
    let overall = output["overall_risk"].as_f64().unwrap();
    assert!((overall - 0.8375).abs() < 1e-9);
    assert!((output["risk_score"].as_f64().unwrap() - 83.75).abs() < 1e-9);
    assert_eq!(output["confidence"], 1.0);
    assert_eq!(output["evidence_hash"].as_str().unwrap().len(), 64);
    assert!(output["reason"]
        .as_str()
        .unwrap()
        .starts_with("[BlockScanner] Minority fork detected at tip"));
    assert!(output.get("published").is_none());
}

#[tokio::test]
async fn test_verdict_is_published_when_oracle_is_registered() {
    let keys = AgentKeypair::from_seed(ORACLE_DID, [11; 32]);
    let bus = Arc::new(MessageBus::new(10));
    bus.register_identity(&keys.identity()).unwrap();
    let (sink, mut rx) = ChannelSink::channel(4);
    bus.connect(Arc::new(sink));

    let agent = oracle(clean_swarm()).with_bus(Arc::clone(&bus));
    let output = agent.process(&json!({"target": VALID_POLICY})).await.unwrap();

    assert_eq!(output["published"], true);
    let envelope = rx.try_recv().unwrap();
    assert_eq!(envelope.message_type, message_types::ORACLE_VERDICT);
    assert_eq!(envelope.payload["status"], "SAFE_CHAIN");
    assert_eq!(envelope.payload["target"], VALID_POLICY);
    assert!(verify_envelope(&envelope, &keys.public_key()));
}

#[tokio::test]
async fn test_unregistered_oracle_still_produces_output() {
    let bus = Arc::new(MessageBus::new(10));
    let agent = oracle(clean_swarm()).with_bus(Arc::clone(&bus));

    let output = agent.process(&json!({"target": VALID_POLICY})).await.unwrap();

    assert_eq!(output["published"], false);
    assert_eq!(output["vote"], "SAFE");
    assert_eq!(bus.history_len(), 0);
}

// ── Hire requests ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hire_request_round_trip() {
    let sentinel = AgentKeypair::from_seed(SENTINEL_DID, [22; 32]);
    let agent = oracle(forked_swarm());
    let bus = MessageBus::new(10);
    bus.register_identity(&sentinel.identity()).unwrap();
    bus.register_identity(&agent.keypair().identity()).unwrap();

    let request = hire_request(&sentinel, agent.did(), VALID_POLICY, 1_234_567);
    assert!(bus.publish(&request).await);

    let response = agent.handle_hire_request(&request).await.unwrap();

    assert_eq!(response.message_type, message_types::HIRE_RESPONSE);
    assert_eq!(response.sender(), Some(ORACLE_DID));
    assert_eq!(response.to_did.as_deref(), Some(SENTINEL_DID));
    assert_eq!(response.payload["status"], "MINORITY_FORK_DETECTED");
    assert_eq!(response.payload["verdict"], "DANGER");
    assert_eq!(response.payload["user_node_tip"], 1_234_567);
    assert_eq!(response.payload["findings"].as_array().unwrap().len(), 5);
    assert_eq!(response.payload["specialist_summary"].as_object().unwrap().len(), 5);
    assert!(verify_envelope(&response, &agent.keypair().public_key()));
    assert!(bus.publish(&response).await);
}

#[tokio::test]
async fn test_hire_handler_rejects_other_message_types() {
    let agent = oracle(clean_swarm());
    let sentinel = AgentKeypair::from_seed(SENTINEL_DID, [22; 32]);
    let mut request = hire_request(&sentinel, ORACLE_DID, VALID_POLICY, 1);
    request.message_type = message_types::CONSENSUS_RESULT.to_string();

    assert!(agent.handle_hire_request(&request).await.is_err());
}

// ── Full pipeline ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_clean_target_passes_the_full_pipeline() {
    let deps = PipelineDependencies {
        wallets: Arc::new(StaticWalletSource::new().with_fallback(established_wallet())),
        sanctions: Arc::new(StaticSanctionsList::default()),
        settlement: None,
        explainer: None,
        event_bus: None,
    };
    let orchestrator = standard_pipeline(
        &OrchestratorConfig::default(),
        Arc::new(oracle(clean_swarm())),
        deps,
    );

    let result = orchestrator.run(VALID_POLICY, json!({"user_tip": 10})).await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.final_verdict, Some(Vote::Safe));
    assert_eq!(result.confidence, Some(1.0));
    assert!(result.final_score.unwrap() < 10.0);
    assert_eq!(result.output_of("oracle").unwrap()["status"], "SAFE_CHAIN");
}

#[tokio::test]
async fn test_forked_chain_and_sanctioned_creator_is_danger() {
    let deps = PipelineDependencies {
        wallets: Arc::new(StaticWalletSource::new().with_fallback(established_wallet())),
        sanctions: Arc::new(StaticSanctionsList::default().with_entry(
            "addr1_sanctioned",
            SanctionsHit {
                list: "OFAC".to_string(),
                reason: "Sanctioned entity".to_string(),
            },
        )),
        settlement: None,
        explainer: None,
        event_bus: None,
    };
    let orchestrator = standard_pipeline(
        &OrchestratorConfig::default(),
        Arc::new(oracle(forked_swarm())),
        deps,
    );

    let result = orchestrator
        .run(
            &format!("dead{}", &VALID_POLICY[4..]),
            json!({"creator_wallet": "addr1_sanctioned"}),
        )
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.final_verdict, Some(Vote::Danger));
    assert_eq!(result.confidence, Some(1.0));
    let consensus = result.output_of("consensus").unwrap();
    assert_eq!(consensus["status"], "COMPLETE");
    assert_eq!(consensus["result"]["agent_votes"].as_array().unwrap().len(), 4);
    assert_eq!(
        result.output_of("compliance").unwrap()["sanctions_check"]["sanctioned"],
        Value::Bool(true)
    );
}

#[tokio::test]
async fn test_pipeline_survives_a_hung_specialist() {
    let mut units = clean_swarm();
    units[4] = Arc::new(
        StaticSpecialist::new("ReplayDetector", SpecialistResult::new(1.0, Severity::Critical))
            .with_delay(Duration::from_secs(30)),
    );
    let config = SpecialistConfig {
        overall_timeout: Duration::from_millis(100),
        ..SpecialistConfig::default()
    };
    let coordinator = SpecialistCoordinator::new(units, &config).unwrap();
    let agent = OracleAgent::new(
        Arc::new(coordinator),
        AgentKeypair::from_seed(ORACLE_DID, [11; 32]),
    );

    let output = agent.process(&json!({"target": VALID_POLICY})).await.unwrap();

    assert_eq!(output["confidence"], 0.8);
    assert_eq!(
        output["specialist_results"]["ReplayDetector"]["findings"][0],
        "Specialist timed out"
    );
}
