// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Property tests for specialist risk fusion.

use proptest::prelude::*;

use sentinel_core::domain::specialist::SpecialistResult;
use sentinel_core::domain::verdict::{Severity, Vote};
use sentinel_swarm::{fuse, FusionPolicy};

const CONFIGURED_UNITS: [&str; 5] = [
    "BlockScanner",
    "StakeAnalyzer",
    "VoteDoctor",
    "MempoolSniffer",
    "ReplayDetector",
];

fn any_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        Just(Severity::Critical),
    ]
}

fn any_risk() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => 0.0f64..=1.0,
        1 => -5.0f64..5.0,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

fn reports() -> impl Strategy<Value = Vec<(f64, Severity, bool)>> {
    prop::collection::vec((any_risk(), any_severity(), any::<bool>()), 1..9)
}

fn unit_name(index: usize) -> String {
    CONFIGURED_UNITS
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Extra{}", index))
}

fn build(reports: &[(f64, Severity, bool)]) -> Vec<(String, SpecialistResult)> {
    reports
        .iter()
        .enumerate()
        .map(|(i, (risk, severity, success))| {
            let mut result = SpecialistResult::new(*risk, *severity).with_finding("observed");
            result.success = *success;
            (unit_name(i), result)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_overall_risk_stays_in_unit_interval(reports in reports()) {
        let fused = fuse(&FusionPolicy::default(), build(&reports));
        prop_assert!(fused.overall_risk.is_finite());
        prop_assert!((0.0..=1.0).contains(&fused.overall_risk), "{}", fused.overall_risk);
    }

    #[test]
    fn prop_confidence_is_successful_share(reports in reports()) {
        let successful = reports.iter().filter(|(_, _, ok)| *ok).count();
        let fused = fuse(&FusionPolicy::default(), build(&reports));
        let expected = successful as f64 / reports.len() as f64;
        prop_assert!((fused.confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn prop_severity_is_highest_reported(reports in reports()) {
        let highest = reports.iter().map(|(_, s, _)| *s).max().unwrap_or_default();
        let fused = fuse(&FusionPolicy::default(), build(&reports));
        prop_assert_eq!(fused.severity, highest);
    }

    #[test]
    fn prop_vote_follows_thresholds(reports in reports()) {
        let policy = FusionPolicy::default();
        let fused = fuse(&policy, build(&reports));
        let expected = if fused.overall_risk >= policy.danger_threshold {
            Vote::Danger
        } else if fused.overall_risk >= policy.warning_threshold {
            Vote::Warning
        } else {
            Vote::Safe
        };
        prop_assert_eq!(fused.vote, expected);
    }

    #[test]
    fn prop_every_unit_is_reported(reports in reports()) {
        let fused = fuse(&FusionPolicy::default(), build(&reports));
        prop_assert_eq!(fused.per_unit_results.len(), reports.len());
        prop_assert_eq!(fused.findings.len(), reports.len());
    }
}
