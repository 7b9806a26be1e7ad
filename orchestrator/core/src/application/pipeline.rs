// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use crate::application::agents::{ComplianceAgent, ConsensusAgent, SentinelAgent, ZkProverAgent};
use crate::application::consensus_engine::ConsensusEngine;
use crate::application::workflow_orchestrator::WorkflowOrchestrator;
use crate::domain::agent::{Explainer, PipelineAgent, SanctionsList, SettlementSink, WalletDataSource};
use crate::domain::config::OrchestratorConfig;
use crate::infrastructure::event_bus::EventBus;

/// External collaborators the standard pipeline needs.
pub struct PipelineDependencies {
    pub wallets: Arc<dyn WalletDataSource>,
    pub sanctions: Arc<dyn SanctionsList>,
    pub settlement: Option<Arc<dyn SettlementSink>>,
    pub explainer: Option<Arc<dyn Explainer>>,
    pub event_bus: Option<EventBus>,
}

/// The five-stage pipeline: sentinel → oracle → compliance → zk_prover → consensus.
///
/// The oracle stage is supplied by the caller since it owns its own
/// specialist fan-out.
pub fn standard_pipeline(
    config: &OrchestratorConfig,
    oracle: Arc<dyn PipelineAgent>,
    deps: PipelineDependencies,
) -> WorkflowOrchestrator {
    let mut engine = ConsensusEngine::new();
    if let Some(sink) = deps.settlement {
        engine = engine.with_settlement(sink);
    }
    if let Some(explainer) = deps.explainer {
        engine = engine.with_explainer(explainer);
    }

    let stages: Vec<Arc<dyn PipelineAgent>> = vec![
        Arc::new(SentinelAgent::new()),
        oracle,
        Arc::new(ComplianceAgent::new(deps.wallets, deps.sanctions)),
        Arc::new(ZkProverAgent::new()),
        Arc::new(ConsensusAgent::new(engine, config.spec.consensus.clone())),
    ];

    let orchestrator = WorkflowOrchestrator::new(stages);
    match deps.event_bus {
        Some(bus) => orchestrator.with_event_bus(bus),
        None => orchestrator,
    }
}
