// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Canned wallet data sources
//
// In-memory stand-ins for the ledger indexer and the sanctions screening
// service. Both are populated up front, typically from a YAML fixture.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::agent::{SanctionsHit, SanctionsList, WalletDataSource, WalletFacts};

/// Wallet facts keyed by address, with an optional fallback for unknown ones.
#[derive(Debug, Clone, Default)]
pub struct StaticWalletSource {
    wallets: HashMap<String, WalletFacts>,
    fallback: Option<WalletFacts>,
}

impl StaticWalletSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(mut self, facts: WalletFacts) -> Self {
        self.wallets.insert(facts.address.clone(), facts);
        self
    }

    /// Facts reported for any address without an explicit entry.
    pub fn with_fallback(mut self, facts: WalletFacts) -> Self {
        self.fallback = Some(facts);
        self
    }
}

#[async_trait]
impl WalletDataSource for StaticWalletSource {
    async fn fetch(&self, address: &str) -> anyhow::Result<WalletFacts> {
        if let Some(facts) = self.wallets.get(address) {
            return Ok(facts.clone());
        }
        match &self.fallback {
            Some(fallback) => Ok(WalletFacts {
                address: address.to_string(),
                ..fallback.clone()
            }),
            None => anyhow::bail!("No wallet data for address '{}'", address),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StaticSanctionsList {
    entries: HashMap<String, SanctionsHit>,
    lists: Vec<String>,
}

impl StaticSanctionsList {
    pub fn new(lists: Vec<String>) -> Self {
        Self {
            entries: HashMap::new(),
            lists,
        }
    }

    pub fn with_entry(mut self, address: impl Into<String>, hit: SanctionsHit) -> Self {
        self.entries.insert(address.into(), hit);
        self
    }
}

impl Default for StaticSanctionsList {
    fn default() -> Self {
        Self::new(vec![
            "OFAC".to_string(),
            "EU Sanctions".to_string(),
            "UN Sanctions".to_string(),
        ])
    }
}

#[async_trait]
impl SanctionsList for StaticSanctionsList {
    async fn screen(&self, address: &str) -> Option<SanctionsHit> {
        self.entries.get(address).cloned()
    }

    fn lists_checked(&self) -> Vec<String> {
        self.lists.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(address: &str, tx_count: u64) -> WalletFacts {
        WalletFacts {
            address: address.to_string(),
            tx_count,
            first_tx_date: None,
            tx_history: vec![],
        }
    }

    #[tokio::test]
    async fn test_known_unknown_and_fallback() {
        let source = StaticWalletSource::new().with_wallet(facts("addr1_known", 5));
        assert_eq!(source.fetch("addr1_known").await.unwrap().tx_count, 5);
        assert!(source.fetch("addr1_other").await.is_err());

        let source = source.with_fallback(facts("template", 9));
        let fetched = source.fetch("addr1_other").await.unwrap();
        assert_eq!(fetched.address, "addr1_other");
        assert_eq!(fetched.tx_count, 9);
    }

    #[tokio::test]
    async fn test_sanctions_screening() {
        let list = StaticSanctionsList::default().with_entry(
            "addr1_bad",
            SanctionsHit {
                list: "OFAC".to_string(),
                reason: "Money laundering".to_string(),
            },
        );
        assert_eq!(list.screen("addr1_bad").await.unwrap().list, "OFAC");
        assert!(list.screen("addr1_good").await.is_none());
        assert_eq!(list.lists_checked().len(), 3);
    }
}
