// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use sentinel_core::domain::config::OrchestratorConfig;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./sentinel-config.yaml)
        #[arg(short, long, default_value = "./sentinel-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = OrchestratorConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. SENTINEL_CONFIG_PATH: {}",
            std::env::var("SENTINEL_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./sentinel-config.yaml");
        println!("  4. ~/.sentinel/config.yaml");
        println!("  5. /etc/sentinel/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let consensus = &config.spec.consensus;
    println!("{}", "Consensus:".bold());
    for (agent, weight) in &consensus.agent_weights {
        println!("  {:<16} {:.2}", agent, weight);
    }
    println!("  Required: {}", consensus.required_agents.join(", "));
    println!("  Unknown agent weight: {:.2}", consensus.default_weight);
    println!();

    let specialists = &config.spec.specialists;
    println!("{}", "Specialists:".bold());
    for (unit, weight) in &specialists.weights {
        println!("  {:<16} {:.2}", unit, weight);
    }
    println!("  Overall timeout: {:?}", specialists.overall_timeout);
    println!(
        "  Placeholder risk: error {:.2}, timeout {:.2}",
        specialists.error_risk, specialists.timeout_risk
    );
    println!(
        "  Vote thresholds: warning ≥ {:.2}, danger ≥ {:.2}",
        specialists.warning_threshold, specialists.danger_threshold
    );
    println!();

    println!("{}", "Message bus:".bold());
    println!("  Protocol: {}", config.spec.bus.protocol);
    println!("  History capacity: {}", config.spec.bus.history_capacity);
    println!("  Delivery timeout: {:?}", config.spec.bus.delivery_timeout);
    println!("  Event channel capacity: {}", config.spec.events.capacity);
    println!();

    println!("{}", "Observability:".bold());
    println!("  Log level: {}", config.spec.observability.log_level);
    println!("  Log format: {}", config.spec.observability.log_format);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = OrchestratorConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
