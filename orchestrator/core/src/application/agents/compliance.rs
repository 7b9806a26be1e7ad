// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Compliance Agent - sanctions screening and wallet behaviour
//
// Screens the wallet behind a target against a sanctions list, scores the
// wallet's on-chain behaviour (0 best, 100 worst) and maps the score to a
// risk modifier. Sanctioned or CRITICAL wallets vote DANGER, HIGH votes
// WARNING, anything else SAFE.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{context_of, target_of};
use crate::domain::agent::{PipelineAgent, SanctionsList, WalletDataSource, WalletFacts};
use crate::domain::envelope::current_timestamp;
use crate::domain::verdict::Vote;
use crate::infrastructure::signing::evidence_hash;

pub const AGENT_NAME: &str = "compliance";

/// Transfers above 100k ADA, in lovelace.
pub const LARGE_TX_LOVELACE: u64 = 100_000_000;
const LARGE_TX_INDICATOR_AFTER: usize = 5;

/// Behaviour score used when the wallet data source fails.
pub const NEUTRAL_BEHAVIOR_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskModifier {
    VeryLow,
    Low,
    Neutral,
    Elevated,
    High,
    Critical,
}

impl RiskModifier {
    pub fn multiplier(self) -> f64 {
        match self {
            RiskModifier::VeryLow => 0.5,
            RiskModifier::Low => 0.7,
            RiskModifier::Neutral => 1.0,
            RiskModifier::Elevated => 1.5,
            RiskModifier::High => 1.8,
            RiskModifier::Critical => 2.0,
        }
    }

    pub fn from_behavior(score: f64, indicator_count: usize) -> Self {
        if score < 20.0 && indicator_count == 0 {
            RiskModifier::VeryLow
        } else if score < 30.0 {
            RiskModifier::Low
        } else if score < 50.0 {
            RiskModifier::Neutral
        } else if score < 70.0 {
            RiskModifier::Elevated
        } else if score < 90.0 {
            RiskModifier::High
        } else {
            RiskModifier::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAnalysis {
    pub wallet_age_days: i64,
    pub transaction_count: u64,
    pub large_transactions: usize,
    pub risk_indicators: Vec<String>,
    pub behavior_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WalletAnalysis {
    /// Derive indicators and the behaviour score from raw wallet facts.
    pub fn from_facts(facts: &WalletFacts, high_value: bool, now: DateTime<Utc>) -> Self {
        let wallet_age_days = wallet_age_days(facts.first_tx_date, now);
        let large_transactions = facts
            .tx_history
            .iter()
            .filter(|tx| tx.amount > LARGE_TX_LOVELACE)
            .count();

        let mut risk_indicators = Vec::new();
        if large_transactions > LARGE_TX_INDICATOR_AFTER {
            risk_indicators.push("Frequent large transactions".to_string());
        }
        if wallet_age_days < 30 {
            risk_indicators.push("Very new wallet (< 30 days)".to_string());
        } else if wallet_age_days < 90 {
            risk_indicators.push("New wallet (< 90 days)".to_string());
        }

        let behavior_score =
            behavior_score(wallet_age_days, risk_indicators.len(), large_transactions, high_value);

        Self {
            wallet_age_days,
            transaction_count: facts.tx_count,
            large_transactions,
            risk_indicators,
            behavior_score,
            error: None,
        }
    }

    fn unavailable(error: String) -> Self {
        Self {
            wallet_age_days: 0,
            transaction_count: 0,
            large_transactions: 0,
            risk_indicators: Vec::new(),
            behavior_score: NEUTRAL_BEHAVIOR_SCORE,
            error: Some(error),
        }
    }
}

/// Whole days since the first transaction; unknown history counts as brand new.
pub fn wallet_age_days(first_tx: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    first_tx
        .map(|first| (now - first).num_days().max(0))
        .unwrap_or(0)
}

/// 0 (clean) – 100 (worst).
pub fn behavior_score(
    wallet_age_days: i64,
    indicator_count: usize,
    large_transactions: usize,
    high_value: bool,
) -> f64 {
    let mut score = 0.0;
    score += if wallet_age_days < 7 {
        25.0
    } else if wallet_age_days < 30 {
        15.0
    } else if wallet_age_days < 90 {
        8.0
    } else {
        0.0
    };
    score += (indicator_count as f64 * 8.0).min(40.0);
    score += (large_transactions as f64 * 2.0).min(20.0);
    if high_value {
        score += 10.0;
    }
    score.min(100.0)
}

pub struct ComplianceAgent {
    wallets: Arc<dyn WalletDataSource>,
    sanctions: Arc<dyn SanctionsList>,
}

impl ComplianceAgent {
    pub fn new(wallets: Arc<dyn WalletDataSource>, sanctions: Arc<dyn SanctionsList>) -> Self {
        Self { wallets, sanctions }
    }

    /// `creator_wallet` from the context, else an address derived from the target.
    pub fn wallet_for(target: &str, context: &Value) -> String {
        if let Some(wallet) = context
            .get("creator_wallet")
            .and_then(Value::as_str)
            .filter(|w| !w.is_empty())
        {
            return wallet.to_string();
        }
        let prefix: String = target.chars().take(40).collect();
        format!("addr1{}", prefix)
    }
}

#[async_trait]
impl PipelineAgent for ComplianceAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    async fn process(&self, input: &Value) -> anyhow::Result<Value> {
        let target = target_of(input);
        let context = context_of(input);
        let wallet = Self::wallet_for(target, context);
        let high_value = context
            .get("high_value_transaction")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let sanctions_hit = self.sanctions.screen(&wallet).await;
        let sanctions_check = match &sanctions_hit {
            Some(hit) => json!({
                "sanctioned": true,
                "list": hit.list,
                "reason": hit.reason,
            }),
            None => json!({
                "sanctioned": false,
                "lists_checked": self.sanctions.lists_checked(),
            }),
        };

        let analysis = match self.wallets.fetch(&wallet).await {
            Ok(facts) => WalletAnalysis::from_facts(&facts, high_value, Utc::now()),
            Err(e) => {
                warn!(agent = AGENT_NAME, wallet = %wallet, error = %e, "Wallet analysis failed; using neutral score");
                WalletAnalysis::unavailable(e.to_string())
            }
        };

        let (modifier, vote, reason, risk_score) = match &sanctions_hit {
            Some(hit) => (
                RiskModifier::Critical,
                Vote::Danger,
                format!("Wallet sanctioned by {}", hit.list),
                100.0,
            ),
            None => {
                let modifier =
                    RiskModifier::from_behavior(analysis.behavior_score, analysis.risk_indicators.len());
                let (vote, reason) = match modifier {
                    RiskModifier::Critical => (Vote::Danger, "Critical compliance risk detected"),
                    RiskModifier::High => (Vote::Warning, "Elevated compliance risk"),
                    _ => (Vote::Safe, "Compliance check passed"),
                };
                (modifier, vote, reason.to_string(), analysis.behavior_score)
            }
        };

        let timestamp = current_timestamp();
        let modifier_text = format!("{:?}", modifier);
        let evidence = evidence_hash(&[
            wallet.as_str(),
            modifier_text.as_str(),
            vote.as_str(),
            timestamp.as_str(),
        ]);
        info!(agent = AGENT_NAME, wallet = %wallet, vote = %vote, risk_score, "Compliance verdict");

        Ok(json!({
            "agent": AGENT_NAME,
            "wallet_address": wallet,
            "vote": vote,
            "risk_score": risk_score,
            "risk_modifier": {
                "level": modifier,
                "multiplier": modifier.multiplier(),
            },
            "reason": reason,
            "sanctions_check": sanctions_check,
            "wallet_analysis": analysis,
            "evidence_hash": evidence,
            "timestamp": timestamp,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{SanctionsHit, WalletTransaction};
    use crate::infrastructure::wallet::{StaticSanctionsList, StaticWalletSource};
    use chrono::Duration;

    fn facts(address: &str, age_days: i64, large: usize) -> WalletFacts {
        WalletFacts {
            address: address.to_string(),
            tx_count: 150,
            first_tx_date: Some(Utc::now() - Duration::days(age_days)),
            tx_history: (0..large)
                .map(|_| WalletTransaction {
                    amount: LARGE_TX_LOVELACE + 1,
                    direction: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_behavior_score_components() {
        assert_eq!(behavior_score(3, 0, 0, false), 25.0);
        assert_eq!(behavior_score(20, 0, 0, false), 15.0);
        assert_eq!(behavior_score(60, 0, 0, false), 8.0);
        assert_eq!(behavior_score(400, 0, 0, false), 0.0);
        assert_eq!(behavior_score(400, 10, 0, false), 40.0);
        assert_eq!(behavior_score(400, 0, 50, false), 20.0);
        assert_eq!(behavior_score(3, 10, 50, true), 95.0);
    }

    #[test]
    fn test_risk_modifier_thresholds() {
        assert_eq!(RiskModifier::from_behavior(10.0, 0), RiskModifier::VeryLow);
        assert_eq!(RiskModifier::from_behavior(10.0, 1), RiskModifier::Low);
        assert_eq!(RiskModifier::from_behavior(30.0, 0), RiskModifier::Neutral);
        assert_eq!(RiskModifier::from_behavior(50.0, 0), RiskModifier::Elevated);
        assert_eq!(RiskModifier::from_behavior(70.0, 0), RiskModifier::High);
        assert_eq!(RiskModifier::from_behavior(90.0, 0), RiskModifier::Critical);
        assert_eq!(RiskModifier::Critical.multiplier(), 2.0);
    }

    #[test]
    fn test_analysis_indicators() {
        let analysis = WalletAnalysis::from_facts(&facts("a", 10, 6), false, Utc::now());
        assert_eq!(
            analysis.risk_indicators,
            vec!["Frequent large transactions", "Very new wallet (< 30 days)"]
        );
        // 15 age + 16 indicators + 12 large
        assert_eq!(analysis.behavior_score, 43.0);

        let analysis = WalletAnalysis::from_facts(&facts("a", 60, 0), false, Utc::now());
        assert_eq!(analysis.risk_indicators, vec!["New wallet (< 90 days)"]);
    }

    #[test]
    fn test_wallet_selection() {
        assert_eq!(
            ComplianceAgent::wallet_for("abc", &json!({"creator_wallet": "addr1_creator"})),
            "addr1_creator"
        );
        let target = "f".repeat(56);
        assert_eq!(
            ComplianceAgent::wallet_for(&target, &Value::Null),
            format!("addr1{}", "f".repeat(40))
        );
    }

    #[tokio::test]
    async fn test_established_wallet_is_safe() {
        let agent = ComplianceAgent::new(
            Arc::new(StaticWalletSource::new().with_wallet(facts("addr1_old", 700, 0))),
            Arc::new(StaticSanctionsList::default()),
        );
        let output = agent
            .process(&json!({"target": "t", "context": {"creator_wallet": "addr1_old"}}))
            .await
            .unwrap();
        assert_eq!(output["vote"], "SAFE");
        assert_eq!(output["risk_score"], 0.0);
        assert_eq!(output["risk_modifier"]["level"], "VERY_LOW");
        assert_eq!(output["sanctions_check"]["sanctioned"], false);
    }

    #[tokio::test]
    async fn test_sanctioned_wallet_is_danger() {
        let agent = ComplianceAgent::new(
            Arc::new(StaticWalletSource::new().with_wallet(facts("addr1_bad", 700, 0))),
            Arc::new(StaticSanctionsList::default().with_entry(
                "addr1_bad",
                SanctionsHit {
                    list: "OFAC".to_string(),
                    reason: "Money laundering".to_string(),
                },
            )),
        );
        let output = agent
            .process(&json!({"target": "t", "context": {"creator_wallet": "addr1_bad"}}))
            .await
            .unwrap();
        assert_eq!(output["vote"], "DANGER");
        assert_eq!(output["risk_score"], 100.0);
        assert_eq!(output["reason"], "Wallet sanctioned by OFAC");
        assert_eq!(output["risk_modifier"]["multiplier"], 2.0);
    }

    #[tokio::test]
    async fn test_data_source_failure_is_neutral() {
        let agent = ComplianceAgent::new(
            Arc::new(StaticWalletSource::new()),
            Arc::new(StaticSanctionsList::default()),
        );
        let output = agent
            .process(&json!({"target": "t", "context": {}}))
            .await
            .unwrap();
        assert_eq!(output["risk_score"], 50.0);
        assert_eq!(output["risk_modifier"]["level"], "ELEVATED");
        assert_eq!(output["vote"], "SAFE");
        assert!(output["wallet_analysis"]["error"].is_string());
    }
}
