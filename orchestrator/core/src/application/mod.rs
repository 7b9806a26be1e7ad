// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agents;
pub mod consensus_engine;
pub mod pipeline;
pub mod workflow_orchestrator;

pub use consensus_engine::ConsensusEngine;
pub use pipeline::{standard_pipeline, PipelineDependencies};
pub use workflow_orchestrator::WorkflowOrchestrator;
