// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Sentinel Orchestrator CLI
//!
//! The `sentinel` binary runs one trust analysis end to end and manages
//! agent identities and configuration.
//!
//! ## Commands
//!
//! - `sentinel analyze <target>` - run the five-stage pipeline
//! - `sentinel keygen --did <did>` - create an agent keypair
//! - `sentinel verify --envelope <file> --public-key <b64>` - check a signed envelope
//! - `sentinel config show|validate|generate` - configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use sentinel_orchestrator::commands::{
    self, AnalyzeArgs, ConfigCommand, KeygenArgs, VerifyArgs,
};

/// Sentinel Orchestrator Network - multi-agent trust verdicts
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SENTINEL_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SENTINEL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "SENTINEL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a policy ID or transaction
    #[command(name = "analyze")]
    Analyze(AnalyzeArgs),

    /// Generate an agent keypair
    #[command(name = "keygen")]
    Keygen(KeygenArgs),

    /// Verify a signed envelope
    #[command(name = "verify")]
    Verify(VerifyArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Some(Commands::Analyze(args)) => commands::analyze::execute(args, cli.config).await,
        Some(Commands::Keygen(args)) => commands::keygen::execute(args).await,
        Some(Commands::Verify(args)) => commands::verify::execute(args).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Text => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
