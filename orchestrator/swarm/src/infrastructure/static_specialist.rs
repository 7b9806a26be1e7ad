// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Static Specialist - canned data source
//
// Stands in for a ledger indexer or DEX API. Returns a fixed result, and can
// be told to wait first or to fail, which is how fixtures and tests exercise
// the coordinator's timeout and error paths.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use sentinel_core::domain::specialist::{Specialist, SpecialistResult};

#[derive(Debug, Clone)]
pub struct StaticSpecialist {
    name: String,
    result: SpecialistResult,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl StaticSpecialist {
    pub fn new(name: impl Into<String>, result: SpecialistResult) -> Self {
        Self {
            name: name.into(),
            result,
            delay: None,
            failure: None,
        }
    }

    /// A unit whose every scan returns `Err(message)`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: SpecialistResult::degraded(0.0, "unreachable", "error"),
            delay: None,
            failure: Some(message.into()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Specialist for StaticSpecialist {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, target: &str, _context: &Value) -> anyhow::Result<SpecialistResult> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        debug!(unit = %self.name, target = %target, "Static specialist scan");
        match &self.failure {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(self.result.clone()),
        }
    }
}
