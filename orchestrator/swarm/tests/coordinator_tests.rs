// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the specialist coordinator.
//!
//! Covers concurrent fan-out, identity-based result matching, per-unit error
//! and panic isolation, the shared deadline, and abortion of late units.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use sentinel_core::domain::config::SpecialistConfig;
use sentinel_core::domain::specialist::{Specialist, SpecialistResult};
use sentinel_core::domain::verdict::{Severity, Vote};
use sentinel_swarm::{SpecialistCoordinator, StaticSpecialist};

const UNITS: [&str; 5] = [
    "BlockScanner",
    "StakeAnalyzer",
    "VoteDoctor",
    "MempoolSniffer",
    "ReplayDetector",
];

/// Remembers what it was asked to scan.
struct Recorder {
    seen: Mutex<Option<(String, Value)>>,
}

#[async_trait]
impl Specialist for Recorder {
    fn name(&self) -> &str {
        "BlockScanner"
    }

    async fn scan(&self, target: &str, context: &Value) -> anyhow::Result<SpecialistResult> {
        if let Ok(mut seen) = self.seen.lock() {
            *seen = Some((target.to_string(), context.clone()));
        }
        Ok(SpecialistResult::new(0.0, Severity::Low))
    }
}

/// Sleeps, then flips a flag. Used to observe whether a timed-out unit was aborted.
struct Sleeper {
    delay: Duration,
    finished: Arc<AtomicBool>,
}

#[async_trait]
impl Specialist for Sleeper {
    fn name(&self) -> &str {
        "ReplayDetector"
    }

    async fn scan(&self, _target: &str, _context: &Value) -> anyhow::Result<SpecialistResult> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(SpecialistResult::new(1.0, Severity::Critical))
    }
}

struct Panicker;

#[async_trait]
impl Specialist for Panicker {
    fn name(&self) -> &str {
        "VoteDoctor"
    }

    async fn scan(&self, _target: &str, _context: &Value) -> anyhow::Result<SpecialistResult> {
        panic!("governance index corrupted")
    }
}

fn config_with_timeout(timeout: Duration) -> SpecialistConfig {
    SpecialistConfig {
        overall_timeout: timeout,
        ..SpecialistConfig::default()
    }
}

fn canned(name: &str, risk: f64, severity: Severity, finding: &str) -> Arc<dyn Specialist> {
    Arc::new(StaticSpecialist::new(
        name,
        SpecialistResult::new(risk, severity).with_finding(finding),
    ))
}

// ── Fan-out ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_results_are_matched_by_unit_not_completion_order() {
    let slow_danger: Arc<dyn Specialist> = Arc::new(
        StaticSpecialist::new("BlockScanner", SpecialistResult::new(0.9, Severity::Critical))
            .with_delay(Duration::from_millis(80)),
    );
    let fast_safe = canned("StakeAnalyzer", 0.1, Severity::Low, "fine");
    let coordinator = SpecialistCoordinator::new(
        vec![slow_danger, fast_safe],
        &config_with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let fused = coordinator.run_all("policy", &Value::Null).await;

    assert_eq!(fused.per_unit_results["BlockScanner"].risk_score, 0.9);
    assert_eq!(fused.per_unit_results["StakeAnalyzer"].risk_score, 0.1);
    // (0.9 × 0.25 + 0.1 × 0.20) / 0.45
    assert!((fused.overall_risk - 0.245 / 0.45).abs() < 1e-12);
    assert_eq!(fused.severity, Severity::Critical);
    assert_eq!(fused.confidence, 1.0);
}

#[tokio::test]
async fn test_units_run_concurrently() {
    let units: Vec<Arc<dyn Specialist>> = UNITS
        .iter()
        .map(|name| {
            Arc::new(
                StaticSpecialist::new(*name, SpecialistResult::new(0.2, Severity::Low))
                    .with_delay(Duration::from_millis(200)),
            ) as Arc<dyn Specialist>
        })
        .collect();
    let coordinator =
        SpecialistCoordinator::new(units, &config_with_timeout(Duration::from_secs(5))).unwrap();

    let started = Instant::now();
    let fused = coordinator.run_all("policy", &Value::Null).await;

    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(fused.confidence, 1.0);
    assert_eq!(fused.per_unit_results.len(), 5);
}

#[tokio::test]
async fn test_target_and_context_reach_every_unit() {
    let recorder = Arc::new(Recorder {
        seen: Mutex::new(None),
    });
    let coordinator = SpecialistCoordinator::new(
        vec![recorder.clone() as Arc<dyn Specialist>],
        &SpecialistConfig::default(),
    )
    .unwrap();

    coordinator.run_all("policy-123", &json!({"user_tip": 42})).await;

    let seen = recorder.seen.lock().unwrap().clone().unwrap();
    assert_eq!(seen.0, "policy-123");
    assert_eq!(seen.1["user_tip"], 42);
}

// ── Partial failure ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_errors_and_panics_are_isolated() {
    let coordinator = SpecialistCoordinator::new(
        vec![
            canned("BlockScanner", 0.3, Severity::Medium, "tip lag"),
            Arc::new(StaticSpecialist::failing("MempoolSniffer", "mempool API 502")),
            Arc::new(Panicker),
        ],
        &config_with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let fused = coordinator.run_all("policy", &Value::Null).await;

    assert!((fused.confidence - 1.0 / 3.0).abs() < 1e-12);
    let mempool = &fused.per_unit_results["MempoolSniffer"];
    assert!(!mempool.success);
    assert_eq!(mempool.risk_score, 0.10);
    assert_eq!(mempool.metadata.get("error"), Some(&Value::Bool(true)));
    assert!(fused
        .findings
        .contains(&"[MempoolSniffer] Specialist error: mempool API 502".to_string()));

    let doctor = &fused.per_unit_results["VoteDoctor"];
    assert!(!doctor.success);
    assert!(doctor.findings[0].contains("governance index corrupted"));
}

#[tokio::test]
async fn test_slow_unit_times_out_without_blocking_the_rest() {
    let coordinator = SpecialistCoordinator::new(
        vec![
            canned("BlockScanner", 0.2, Severity::Low, "ok"),
            Arc::new(
                StaticSpecialist::new("StakeAnalyzer", SpecialistResult::new(1.0, Severity::Critical))
                    .with_delay(Duration::from_secs(30)),
            ),
        ],
        &config_with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let started = Instant::now();
    let fused = coordinator.run_all("policy", &Value::Null).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    let stake = &fused.per_unit_results["StakeAnalyzer"];
    assert!(!stake.success);
    assert_eq!(stake.risk_score, 0.15);
    assert_eq!(stake.findings, vec!["Specialist timed out"]);
    assert_eq!(stake.severity, Severity::Low);
    assert_eq!(fused.confidence, 0.5);
}

#[tokio::test]
async fn test_timed_out_unit_is_aborted() {
    let finished = Arc::new(AtomicBool::new(false));
    let coordinator = SpecialistCoordinator::new(
        vec![Arc::new(Sleeper {
            delay: Duration::from_millis(300),
            finished: Arc::clone(&finished),
        })],
        &config_with_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let fused = coordinator.run_all("policy", &Value::Null).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(!finished.load(Ordering::SeqCst));
    assert_eq!(fused.per_unit_results["ReplayDetector"].risk_score, 0.15);
    assert_eq!(fused.severity, Severity::Low);
}

#[tokio::test]
async fn test_all_units_failing_still_yields_a_result() {
    let units: Vec<Arc<dyn Specialist>> = UNITS
        .iter()
        .map(|name| Arc::new(StaticSpecialist::failing(*name, "offline")) as Arc<dyn Specialist>)
        .collect();
    let coordinator =
        SpecialistCoordinator::new(units, &SpecialistConfig::default()).unwrap();

    let fused = coordinator.run_all("policy", &Value::Null).await;

    assert_eq!(fused.confidence, 0.0);
    assert!((fused.overall_risk - 0.10).abs() < 1e-12);
    assert_eq!(fused.vote, Vote::Safe);
    assert_eq!(fused.findings.len(), 5);
}
