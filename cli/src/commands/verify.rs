// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sentinel verify` - check the signature on a saved envelope

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Args;
use colored::Colorize;

use sentinel_core::domain::envelope::MessageEnvelope;
use sentinel_core::infrastructure::signing::{decode_public_key, verify_envelope};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON file holding a signed envelope
    #[arg(long, value_name = "FILE")]
    pub envelope: PathBuf,

    /// Sender's public key, base64
    #[arg(long, value_name = "B64")]
    pub public_key: String,
}

pub async fn execute(args: VerifyArgs) -> Result<()> {
    let envelope = read_envelope(&args.envelope)?;
    let public_key = STANDARD
        .decode(args.public_key.trim())
        .context("Public key is not valid base64")?;
    decode_public_key(&public_key).context("Public key is not a valid Ed25519 key")?;

    if verify_envelope(&envelope, &public_key) {
        println!(
            "{} {} from {}",
            "✓ Valid signature:".green(),
            envelope.message_type,
            envelope.sender().unwrap_or("(no sender)")
        );
        Ok(())
    } else {
        println!("{}", "✗ Signature does not verify".red());
        anyhow::bail!("Envelope signature verification failed")
    }
}

pub fn read_envelope(path: &Path) -> Result<MessageEnvelope> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read envelope {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed envelope in {:?}", path))
}
