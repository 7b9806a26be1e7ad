// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Canned analysis data for `sentinel analyze`.
//!
//! A fixture stands in for every external data source the pipeline needs:
//! specialist answers, wallet facts from an indexer, and sanctions lists.
//!
//! ```yaml
//! specialists:
//!   - name: BlockScanner
//!     risk_score: 0.05
//!     severity: low
//!     findings: ["Tip in sync with mainnet"]
//!   - name: MempoolSniffer
//!     error: "mempool API unavailable"
//! wallets:
//!   - address: addr1_creator
//!     tx_count: 120
//!     first_tx_date: 2024-01-01T00:00:00Z
//! sanctions:
//!   - address: addr1_bad
//!     list: OFAC
//!     reason: Sanctioned entity
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sentinel_core::domain::agent::{SanctionsHit, WalletFacts};
use sentinel_core::domain::specialist::{Specialist, SpecialistResult};
use sentinel_core::domain::verdict::Severity;
use sentinel_core::infrastructure::wallet::{StaticSanctionsList, StaticWalletSource};
use sentinel_swarm::StaticSpecialist;

/// Fixture used when `--fixture` is not given.
pub const DEFAULT_FIXTURE: &str = include_str!("../templates/fixture-clean.yaml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub specialists: Vec<SpecialistFixture>,
    #[serde(default)]
    pub wallets: Vec<WalletFacts>,
    /// Facts reported for any wallet not listed in `wallets`.
    #[serde(default)]
    pub default_wallet: Option<WalletFacts>,
    #[serde(default)]
    pub sanctions: Vec<SanctionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistFixture {
    pub name: String,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default = "default_success")]
    pub success: bool,
    /// Artificial latency before the unit answers.
    #[serde(default)]
    pub delay_ms: Option<u64>,
    /// When set, the unit fails with this message instead of answering.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanctionEntry {
    pub address: String,
    pub list: String,
    #[serde(default)]
    pub reason: String,
}

fn default_success() -> bool {
    true
}

impl Fixture {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let fixture: Self = serde_yaml::from_str(yaml).context("Failed to parse fixture YAML")?;
        if fixture.specialists.is_empty() {
            anyhow::bail!("Fixture must define at least one specialist");
        }
        Ok(fixture)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {:?}", path))?;
        Self::from_yaml_str(&content)
    }

    /// `path` when given, otherwise the built-in clean fixture.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Self::from_yaml_str(DEFAULT_FIXTURE),
        }
    }

    pub fn specialists(&self) -> Vec<Arc<dyn Specialist>> {
        self.specialists
            .iter()
            .map(|spec| Arc::new(spec.to_specialist()) as Arc<dyn Specialist>)
            .collect()
    }

    pub fn wallet_source(&self) -> StaticWalletSource {
        let mut source = self
            .wallets
            .iter()
            .cloned()
            .fold(StaticWalletSource::new(), StaticWalletSource::with_wallet);
        if let Some(fallback) = &self.default_wallet {
            source = source.with_fallback(fallback.clone());
        }
        source
    }

    pub fn sanctions_list(&self) -> StaticSanctionsList {
        self.sanctions
            .iter()
            .fold(StaticSanctionsList::default(), |list, entry| {
                list.with_entry(
                    entry.address.clone(),
                    SanctionsHit {
                        list: entry.list.clone(),
                        reason: entry.reason.clone(),
                    },
                )
            })
    }
}

impl SpecialistFixture {
    fn to_specialist(&self) -> StaticSpecialist {
        let mut unit = match &self.error {
            Some(message) => StaticSpecialist::failing(self.name.clone(), message.clone()),
            None => {
                let mut result = SpecialistResult::new(self.risk_score, self.severity);
                result.findings = self.findings.clone();
                result.success = self.success;
                StaticSpecialist::new(self.name.clone(), result)
            }
        };
        if let Some(ms) = self.delay_ms {
            unit = unit.with_delay(Duration::from_millis(ms));
        }
        unit
    }
}
