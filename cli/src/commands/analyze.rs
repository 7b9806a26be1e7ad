// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sentinel analyze` - run the five-stage pipeline against one target
//!
//! External data comes from a fixture file; see [`crate::fixture`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::{json, Value};
use tracing::{debug, info};

use sentinel_core::application::pipeline::{standard_pipeline, PipelineDependencies};
use sentinel_core::domain::config::OrchestratorConfig;
use sentinel_core::domain::verdict::Vote;
use sentinel_core::domain::workflow::{WorkflowResult, WorkflowStatus};
use sentinel_core::infrastructure::event_bus::{DomainEvent, EventBus};
use sentinel_core::infrastructure::explainer::TemplateExplainer;
use sentinel_core::infrastructure::message_bus::MessageBus;
use sentinel_core::infrastructure::settlement::MockSettlementSink;
use sentinel_core::infrastructure::signing::AgentKeypair;
use sentinel_swarm::{OracleAgent, SpecialistCoordinator};

use crate::fixture::Fixture;

pub const ORACLE_DID: &str = "did:masumi:oracle_01";

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Policy ID or transaction hash to analyse
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// YAML fixture with specialist, wallet and sanctions data
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Creator wallet to screen (default: derived from the target)
    #[arg(long, value_name = "ADDR")]
    pub wallet: Option<String>,

    /// Transaction CBOR to check alongside the target
    #[arg(long, value_name = "HEX")]
    pub tx_cbor: Option<String>,

    /// Mark the transaction as high value
    #[arg(long)]
    pub high_value: bool,

    /// Print the full workflow result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AnalyzeArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = OrchestratorConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let fixture = Fixture::load(args.fixture.as_deref())?;
    let result = run(&config, &fixture, &args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if result.status == WorkflowStatus::Failed {
        anyhow::bail!(
            "Workflow failed at stage '{}'",
            result.failed_agent.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}

/// Wire the pipeline from configuration and fixture data and run it once.
pub async fn run(config: &OrchestratorConfig, fixture: &Fixture, args: &AnalyzeArgs) -> Result<WorkflowResult> {
    let events = EventBus::new(config.spec.events.capacity);
    let mut observer = events.subscribe();

    let bus = Arc::new(
        MessageBus::new(config.spec.bus.history_capacity)
            .with_delivery_timeout(config.spec.bus.delivery_timeout)
            .with_event_bus(events.clone()),
    );
    let oracle_keys = AgentKeypair::generate(ORACLE_DID);
    bus.register_identity(&oracle_keys.identity())
        .context("Failed to register oracle identity")?;

    let coordinator = SpecialistCoordinator::new(fixture.specialists(), &config.spec.specialists)
        .context("Invalid specialist setup")?;
    let oracle = OracleAgent::new(Arc::new(coordinator), oracle_keys).with_bus(Arc::clone(&bus));

    let deps = PipelineDependencies {
        wallets: Arc::new(fixture.wallet_source()),
        sanctions: Arc::new(fixture.sanctions_list()),
        settlement: Some(Arc::new(MockSettlementSink)),
        explainer: Some(Arc::new(TemplateExplainer)),
        event_bus: Some(events),
    };
    let orchestrator = standard_pipeline(config, Arc::new(oracle), deps);

    info!(target = %args.target, stages = ?orchestrator.stage_names(), "Starting analysis");
    let result = orchestrator.run(&args.target, context_for(args)).await;

    let mut seen = 0usize;
    while let Ok(event) = observer.try_recv() {
        seen += 1;
        match event {
            DomainEvent::Workflow(event) => debug!(event = ?event, "Workflow event"),
            DomainEvent::MessageBus(event) => debug!(event = ?event, "Message bus event"),
        }
    }
    debug!(events = seen, history = bus.history_len(), "Analysis finished");

    Ok(result)
}

fn context_for(args: &AnalyzeArgs) -> Value {
    let mut context = json!({ "high_value_transaction": args.high_value });
    if let Some(wallet) = &args.wallet {
        context["creator_wallet"] = json!(wallet);
    }
    if let Some(cbor) = &args.tx_cbor {
        context["tx_cbor"] = json!(cbor);
    }
    context
}

fn print_summary(result: &WorkflowResult) {
    let verdict = result.final_verdict.unwrap_or(Vote::Warning);
    let painted = match verdict {
        Vote::Safe => verdict.to_string().green().bold(),
        Vote::Warning => verdict.to_string().yellow().bold(),
        Vote::Danger => verdict.to_string().red().bold(),
    };

    println!("{}", "Analysis result:".bold());
    println!("  Workflow: {}", result.id);
    println!("  Target: {}", result.target);
    println!("  Status: {}", result.status);
    println!("  Verdict: {}", painted);
    println!("  Score: {:.2}/100", result.final_score.unwrap_or_default());
    println!("  Confidence: {:.0}%", result.confidence.unwrap_or_default() * 100.0);
    println!();

    println!("{}", "Stages:".bold());
    for (agent, ms) in &result.per_agent_duration_ms {
        let vote = result
            .output_of(agent)
            .and_then(|o| o.get("vote"))
            .and_then(Value::as_str)
            .unwrap_or("-");
        println!("  {:<12} {:>6} ms  {}", agent, ms, vote);
    }
    if let Some(total) = result.total_duration_ms {
        println!("  {:<12} {:>6} ms", "total".dimmed(), total);
    }

    if let Some(consensus) = result.output_of("consensus") {
        if let Some(text) = consensus.get("explanation").and_then(Value::as_str) {
            println!();
            println!("{}", text);
        }
        if let Some(reference) = consensus
            .get("settlement")
            .and_then(|s| s.get("reference"))
            .and_then(Value::as_str)
        {
            println!("  Settlement: {}", reference.dimmed());
        }
    }

    if let Some(error) = &result.error {
        println!();
        println!("{} {}", "✗".red(), error);
    }
}
