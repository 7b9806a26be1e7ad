// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Analysis Workflow Domain
//!
//! A [`WorkflowResult`] is created when an analysis run starts and is mutated
//! in place as each pipeline stage finishes. Status transitions are one-way:
//!
//! ```text
//! PENDING ──▶ RUNNING ──▶ COMPLETED
//!    │           │
//!    └───────────┴──────▶ FAILED
//! ```
//!
//! Once terminal, the result is frozen: every mutator returns
//! [`WorkflowError::InvalidTransition`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::consensus::FALLBACK_SCORE;
use crate::domain::verdict::Vote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub Uuid);

impl WorkflowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WorkflowStatus::Pending => "PENDING",
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub id: WorkflowId,
    pub target: String,
    pub status: WorkflowStatus,
    /// Stage names in the order they completed.
    pub completed_agents: Vec<String>,
    pub per_agent_result: BTreeMap<String, Value>,
    pub per_agent_duration_ms: BTreeMap<String, u64>,
    pub final_verdict: Option<Vote>,
    pub final_score: Option<f64>,
    pub confidence: Option<f64>,
    pub failed_agent: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Invalid workflow transition from {from} to {to}")]
    InvalidTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
    #[error("Stage '{agent}' failed: {message}")]
    StageFailed { agent: String, message: String },
}

impl WorkflowResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::new(),
            target: target.into(),
            status: WorkflowStatus::Pending,
            completed_agents: Vec::new(),
            per_agent_result: BTreeMap::new(),
            per_agent_duration_ms: BTreeMap::new(),
            final_verdict: None,
            final_score: None,
            confidence: None,
            failed_agent: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
            total_duration_ms: None,
        }
    }

    pub fn start(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowStatus::Pending, WorkflowStatus::Running)
    }

    /// Record a finished stage's output and wall-clock duration.
    pub fn record_stage(
        &mut self,
        agent: impl Into<String>,
        output: Value,
        duration_ms: u64,
    ) -> Result<(), WorkflowError> {
        self.ensure_running(WorkflowStatus::Running)?;
        let agent = agent.into();
        self.per_agent_duration_ms.insert(agent.clone(), duration_ms);
        self.per_agent_result.insert(agent.clone(), output);
        self.completed_agents.push(agent);
        Ok(())
    }

    pub fn complete(
        &mut self,
        final_verdict: Vote,
        final_score: f64,
        confidence: f64,
    ) -> Result<(), WorkflowError> {
        self.transition(WorkflowStatus::Running, WorkflowStatus::Completed)?;
        self.final_verdict = Some(final_verdict);
        self.final_score = Some(final_score);
        self.confidence = Some(confidence);
        self.finish();
        Ok(())
    }

    /// Mark the run failed at `agent`. Outputs of earlier stages are retained.
    pub fn fail(
        &mut self,
        agent: impl Into<String>,
        error: impl Into<String>,
        duration_ms: Option<u64>,
    ) -> Result<(), WorkflowError> {
        if self.status.is_terminal() {
            return Err(WorkflowError::InvalidTransition {
                from: self.status,
                to: WorkflowStatus::Failed,
            });
        }
        let agent = agent.into();
        if let Some(ms) = duration_ms {
            self.per_agent_duration_ms.insert(agent.clone(), ms);
        }
        self.status = WorkflowStatus::Failed;
        self.failed_agent = Some(agent);
        self.error = Some(error.into());
        self.final_verdict = Some(Vote::Warning);
        self.final_score = Some(FALLBACK_SCORE);
        self.confidence = Some(0.0);
        self.finish();
        Ok(())
    }

    pub fn output_of(&self, agent: &str) -> Option<&Value> {
        self.per_agent_result.get(agent)
    }

    fn transition(
        &mut self,
        from: WorkflowStatus,
        to: WorkflowStatus,
    ) -> Result<(), WorkflowError> {
        if self.status != from {
            return Err(WorkflowError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    fn ensure_running(&self, to: WorkflowStatus) -> Result<(), WorkflowError> {
        if self.status == WorkflowStatus::Running {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    fn finish(&mut self) {
        let now = Utc::now();
        let elapsed = (now - self.started_at).num_milliseconds().max(0) as u64;
        self.completed_at = Some(now);
        self.total_duration_ms = Some(elapsed);
    }
}
