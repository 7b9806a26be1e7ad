// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sentinel keygen` - create an Ed25519 agent identity

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use sentinel_core::infrastructure::signing::AgentKeypair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// DID the keypair is issued for
    #[arg(long, value_name = "DID")]
    pub did: String,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: KeygenArgs) -> Result<()> {
    let keypair = AgentKeypair::generate(args.did);
    let seed = hex::encode(keypair.seed());

    if args.json {
        let out = json!({
            "did": keypair.did(),
            "seed_hex": seed,
            "public_key": keypair.public_key_base64(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", "Agent identity:".bold());
    println!("  DID: {}", keypair.did());
    println!("  Public key (base64): {}", keypair.public_key_base64());
    println!("  Seed (hex): {}", seed);
    println!();
    println!("{}", "Keep the seed secret; it is the private key.".yellow());
    Ok(())
}
