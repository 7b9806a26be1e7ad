// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Specialist Coordinator
//!
//! Runs every registered [`Specialist`] concurrently against one target and
//! fuses what comes back.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Parallel fan-out, per-unit isolation, shared deadline
//! - **Dependencies:** Domain (fusion, failure), Core (Specialist trait, config)
//!
//! Each unit runs in its own Tokio task. Results are matched back to the unit
//! that produced them by registration index, never by completion order. When
//! the overall deadline passes, pending tasks are aborted and recorded as
//! timed out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::domain::failure::UnitFailure;
use crate::domain::fusion::{fuse, FusionPolicy};
use sentinel_core::domain::config::SpecialistConfig;
use sentinel_core::domain::specialist::{AggregatedResult, Specialist, SpecialistResult};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinatorError {
    #[error("No specialists registered")]
    NoUnits,
    #[error("Specialist '{0}' registered more than once")]
    DuplicateUnit(String),
    #[error("Specialist '{unit}' has negative weight {weight}")]
    NegativeWeight { unit: String, weight: f64 },
    #[error("Every registered specialist has zero weight")]
    NoPositiveWeight,
    #[error("Overall timeout must be greater than zero")]
    ZeroTimeout,
}

pub struct SpecialistCoordinator {
    units: Vec<Arc<dyn Specialist>>,
    policy: FusionPolicy,
    overall_timeout: Duration,
    error_risk: f64,
    timeout_risk: f64,
}

impl std::fmt::Debug for SpecialistCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistCoordinator")
            .field("units", &self.unit_names())
            .field("policy", &self.policy)
            .field("overall_timeout", &self.overall_timeout)
            .finish()
    }
}

impl SpecialistCoordinator {
    pub fn new(
        units: Vec<Arc<dyn Specialist>>,
        config: &SpecialistConfig,
    ) -> Result<Self, CoordinatorError> {
        if units.is_empty() {
            return Err(CoordinatorError::NoUnits);
        }
        if config.overall_timeout.is_zero() {
            return Err(CoordinatorError::ZeroTimeout);
        }

        let policy = FusionPolicy::from_config(config);
        let mut seen = HashSet::new();
        let mut any_positive = false;
        for unit in &units {
            let name = unit.name();
            if !seen.insert(name.to_string()) {
                return Err(CoordinatorError::DuplicateUnit(name.to_string()));
            }
            let weight = policy.weight_for(name);
            if weight < 0.0 || weight.is_nan() {
                return Err(CoordinatorError::NegativeWeight {
                    unit: name.to_string(),
                    weight,
                });
            }
            any_positive |= weight > 0.0;
        }
        if !any_positive {
            return Err(CoordinatorError::NoPositiveWeight);
        }

        Ok(Self {
            units,
            policy,
            overall_timeout: config.overall_timeout,
            error_risk: config.error_risk,
            timeout_risk: config.timeout_risk,
        })
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.units.iter().map(|u| u.name().to_string()).collect()
    }

    pub fn overall_timeout(&self) -> Duration {
        self.overall_timeout
    }

    pub fn policy(&self) -> &FusionPolicy {
        &self.policy
    }

    /// Fan out to every unit, wait at most the overall timeout, fuse.
    pub async fn run_all(&self, target: &str, context: &Value) -> AggregatedResult {
        let deadline = Instant::now() + self.overall_timeout;
        debug!(units = self.units.len(), timeout_ms = self.overall_timeout.as_millis() as u64, "Specialist fan-out started");

        let tasks: Vec<(String, JoinHandle<anyhow::Result<SpecialistResult>>)> = self
            .units
            .iter()
            .map(|unit| {
                let unit = Arc::clone(unit);
                let target = target.to_string();
                let context = context.clone();
                let name = unit.name().to_string();
                let handle = tokio::spawn(async move { unit.scan(&target, &context).await });
                (name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (name, mut handle) in tasks {
            let result = match timeout_at(deadline, &mut handle).await {
                Ok(Ok(Ok(result))) => {
                    debug!(unit = %name, risk = result.risk_score, success = result.success, "Specialist reported");
                    result
                }
                Ok(Ok(Err(e))) => {
                    warn!(unit = %name, error = %format!("{:#}", e), "Specialist failed");
                    UnitFailure::Error(format!("{:#}", e)).degraded(self.error_risk)
                }
                Ok(Err(join_error)) => {
                    warn!(unit = %name, error = %join_error, "Specialist task aborted");
                    UnitFailure::Error(join_failure(join_error)).degraded(self.error_risk)
                }
                Err(_) => {
                    handle.abort();
                    warn!(unit = %name, "Specialist timed out");
                    UnitFailure::Timeout.degraded(self.timeout_risk)
                }
            };
            results.push((name, result));
        }

        let aggregated = fuse(&self.policy, results);
        info!(
            overall_risk = aggregated.overall_risk,
            vote = %aggregated.vote,
            confidence = aggregated.confidence,
            findings = aggregated.findings.len(),
            "Specialist fusion complete"
        );
        aggregated
    }
}

fn join_failure(error: JoinError) -> String {
    if error.is_panic() {
        let panic = error.into_panic();
        if let Some(text) = panic.downcast_ref::<&str>() {
            return format!("panicked: {}", text);
        }
        if let Some(text) = panic.downcast_ref::<String>() {
            return format!("panicked: {}", text);
        }
        return "panicked".to_string();
    }
    error.to_string()
}
