// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use sentinel_core::domain::specialist::SpecialistResult;
use thiserror::Error;

/// Why a unit produced no result of its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitFailure {
    #[error("Specialist error: {0}")]
    Error(String),
    #[error("Specialist timed out")]
    Timeout,
}

impl UnitFailure {
    /// Metadata flag set on the placeholder result.
    pub fn marker(&self) -> &'static str {
        match self {
            UnitFailure::Error(_) => "error",
            UnitFailure::Timeout => "timeout",
        }
    }

    /// Placeholder recorded in place of the missing result.
    pub fn degraded(&self, risk_score: f64) -> SpecialistResult {
        SpecialistResult::degraded(risk_score, self.to_string(), self.marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::domain::verdict::Severity;
    use serde_json::Value;

    #[test]
    fn test_error_and_timeout_are_distinguishable() {
        let error = UnitFailure::Error("connection refused".into()).degraded(0.10);
        let timeout = UnitFailure::Timeout.degraded(0.15);

        assert_eq!(error.findings, vec!["Specialist error: connection refused"]);
        assert_eq!(error.metadata.get("error"), Some(&Value::Bool(true)));
        assert_eq!(error.risk_score, 0.10);

        assert_eq!(timeout.findings, vec!["Specialist timed out"]);
        assert_eq!(timeout.metadata.get("timeout"), Some(&Value::Bool(true)));
        assert_eq!(timeout.severity, Severity::Low);
        assert!(!timeout.success);
    }
}
