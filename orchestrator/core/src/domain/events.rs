// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::verdict::Vote;
use crate::domain::workflow::WorkflowId;

/// Pipeline lifecycle events emitted by the workflow orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    WorkflowStarted {
        workflow_id: WorkflowId,
        target: String,
        stages: Vec<String>,
        started_at: DateTime<Utc>,
    },
    AgentStarted {
        workflow_id: WorkflowId,
        agent: String,
        started_at: DateTime<Utc>,
    },
    AgentCompleted {
        workflow_id: WorkflowId,
        agent: String,
        duration_ms: u64,
        /// Vote reported by the stage, when it reported one.
        vote: Option<Vote>,
        completed_at: DateTime<Utc>,
    },
    AgentFailed {
        workflow_id: WorkflowId,
        agent: String,
        duration_ms: u64,
        error: String,
        failed_at: DateTime<Utc>,
    },
    WorkflowCompleted {
        workflow_id: WorkflowId,
        final_verdict: Vote,
        final_score: f64,
        confidence: f64,
        total_duration_ms: u64,
        completed_at: DateTime<Utc>,
    },
    WorkflowFailed {
        workflow_id: WorkflowId,
        failed_agent: String,
        error: String,
        failed_at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            WorkflowEvent::WorkflowStarted { workflow_id, .. }
            | WorkflowEvent::AgentStarted { workflow_id, .. }
            | WorkflowEvent::AgentCompleted { workflow_id, .. }
            | WorkflowEvent::AgentFailed { workflow_id, .. }
            | WorkflowEvent::WorkflowCompleted { workflow_id, .. }
            | WorkflowEvent::WorkflowFailed { workflow_id, .. } => *workflow_id,
        }
    }
}

/// Trust-boundary events emitted by the message bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageBusEvent {
    EnvelopeAccepted {
        from_did: String,
        message_type: String,
        subscribers: usize,
        accepted_at: DateTime<Utc>,
    },
    /// The rejection reason stays local; it is never sent back to the network.
    EnvelopeRejected {
        from_did: Option<String>,
        message_type: String,
        reason: String,
        rejected_at: DateTime<Utc>,
    },
    SubscriberDropped {
        subscriber_id: u64,
        dropped_at: DateTime<Utc>,
    },
}
