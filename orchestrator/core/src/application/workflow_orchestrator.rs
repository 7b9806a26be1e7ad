// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Workflow Orchestrator Application Service
//!
//! Drives a fixed, ordered list of [`PipelineAgent`]s over one target.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Sequential stage execution, timing, lifecycle events
//! - **Dependencies:** Domain (Workflow, Agent, Events), Infrastructure (EventBus)
//!
//! # Stage Loop
//!
//! ```text
//! input = { target, context }
//! for stage in stages {
//!     emit AgentStarted
//!     output = stage.process(input)        // errors and panics both fail the run
//!     record output + duration_ms
//!     emit AgentCompleted
//!     input["<stage>_output"] = output
//! }
//! verdict, score, confidence <- last stage output
//! ```
//!
//! Stage N+1 never starts before stage N returns. On the first failing stage
//! the run is marked FAILED, the remaining stages are skipped, and outputs of
//! the stages that already finished stay in the result. There is no retry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::domain::agent::PipelineAgent;
use crate::domain::consensus::FALLBACK_SCORE;
use crate::domain::events::WorkflowEvent;
use crate::domain::verdict::Vote;
use crate::domain::workflow::{WorkflowError, WorkflowId, WorkflowResult};
use crate::infrastructure::event_bus::EventBus;

pub struct WorkflowOrchestrator {
    stages: Vec<Arc<dyn PipelineAgent>>,
    event_bus: Option<EventBus>,
}

impl WorkflowOrchestrator {
    pub fn new(stages: Vec<Arc<dyn PipelineAgent>>) -> Self {
        Self {
            stages,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run every stage in order. Always returns a terminal result.
    pub async fn run(&self, target: &str, context: Value) -> WorkflowResult {
        let mut workflow = WorkflowResult::new(target);
        let workflow_id = workflow.id;
        let clock = Instant::now();
        if let Err(e) = workflow.start() {
            warn!(workflow_id = %workflow_id, error = %e, "Workflow could not start");
        }

        info!(workflow_id = %workflow_id, target = %target, stages = self.stages.len(), "Workflow started");
        self.emit(WorkflowEvent::WorkflowStarted {
            workflow_id,
            target: target.to_string(),
            stages: self.stage_names(),
            started_at: workflow.started_at,
        });

        if self.stages.is_empty() {
            self.fail(&mut workflow, "workflow", "pipeline has no stages".to_string(), None);
            return workflow;
        }

        let mut input = Map::new();
        input.insert("target".to_string(), Value::String(target.to_string()));
        input.insert("context".to_string(), context);

        let mut last_output = Value::Null;
        for stage in &self.stages {
            let name = stage.name().to_string();
            self.emit(WorkflowEvent::AgentStarted {
                workflow_id,
                agent: name.clone(),
                started_at: Utc::now(),
            });

            let stage_input = Value::Object(input.clone());
            let started = Instant::now();
            let outcome = AssertUnwindSafe(stage.process(&stage_input))
                .catch_unwind()
                .await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let output = match outcome {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    let message = format!("{:#}", e);
                    self.stage_failed(&mut workflow, &name, message, duration_ms);
                    return workflow;
                }
                Err(panic) => {
                    let message = format!("stage panicked: {}", panic_message(panic.as_ref()));
                    self.stage_failed(&mut workflow, &name, message, duration_ms);
                    return workflow;
                }
            };

            if let Err(e) = workflow.record_stage(name.clone(), output.clone(), duration_ms) {
                warn!(workflow_id = %workflow_id, agent = %name, error = %e, "Could not record stage output");
            }
            info!(workflow_id = %workflow_id, agent = %name, duration_ms, "Agent completed");
            self.emit(WorkflowEvent::AgentCompleted {
                workflow_id,
                agent: name.clone(),
                duration_ms,
                vote: vote_field(&output, "vote"),
                completed_at: Utc::now(),
            });

            input.insert(format!("{}_output", name), output.clone());
            last_output = output;
        }

        let (verdict, score, confidence) = terminal_verdict(&last_output);
        if let Err(e) = workflow.complete(verdict, score, confidence) {
            warn!(workflow_id = %workflow_id, error = %e, "Could not complete workflow");
        }
        let total_duration_ms = workflow
            .total_duration_ms
            .unwrap_or_else(|| clock.elapsed().as_millis() as u64);

        info!(
            workflow_id = %workflow_id,
            verdict = %verdict,
            score,
            total_duration_ms,
            "Workflow completed"
        );
        self.emit(WorkflowEvent::WorkflowCompleted {
            workflow_id,
            final_verdict: verdict,
            final_score: score,
            confidence,
            total_duration_ms,
            completed_at: Utc::now(),
        });

        workflow
    }

    fn stage_failed(&self, workflow: &mut WorkflowResult, agent: &str, message: String, duration_ms: u64) {
        error!(workflow_id = %workflow.id, agent = %agent, error = %message, "Agent failed");
        self.emit(WorkflowEvent::AgentFailed {
            workflow_id: workflow.id,
            agent: agent.to_string(),
            duration_ms,
            error: message.clone(),
            failed_at: Utc::now(),
        });
        self.fail(workflow, agent, message, Some(duration_ms));
    }

    fn fail(&self, workflow: &mut WorkflowResult, agent: &str, message: String, duration_ms: Option<u64>) {
        let failure = WorkflowError::StageFailed {
            agent: agent.to_string(),
            message: message.clone(),
        };
        if let Err(e) = workflow.fail(agent, failure.to_string(), duration_ms) {
            warn!(workflow_id = %workflow.id, error = %e, "Could not mark workflow failed");
        }
        self.emit(WorkflowEvent::WorkflowFailed {
            workflow_id: workflow.id,
            failed_agent: agent.to_string(),
            error: message,
            failed_at: Utc::now(),
        });
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_workflow_event(event);
        }
    }

    /// Events for `workflow_id` only; a convenience for observers.
    pub fn subscribe(&self, workflow_id: WorkflowId) -> Option<crate::infrastructure::event_bus::WorkflowEventReceiver> {
        self.event_bus.as_ref().map(|bus| bus.subscribe_workflow(workflow_id))
    }
}

fn vote_field(output: &Value, key: &str) -> Option<Vote> {
    output.get(key)?.as_str()?.parse().ok()
}

/// Verdict, score and confidence reported by the terminal stage.
fn terminal_verdict(output: &Value) -> (Vote, f64, f64) {
    let score = output
        .get("final_score")
        .or_else(|| output.get("risk_score"))
        .and_then(Value::as_f64);
    let verdict = vote_field(output, "final_verdict")
        .or_else(|| vote_field(output, "vote"))
        .or_else(|| score.map(Vote::from_score))
        .unwrap_or(Vote::Warning);
    let confidence = output
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    (verdict, score.unwrap_or(FALLBACK_SCORE), confidence)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
