// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Verdicts and Severities
//!
//! Closed enumerations shared by every agent:
//!
//! | Type | Values | Ordering |
//! |------|--------|----------|
//! | [`Vote`] | `SAFE`, `WARNING`, `DANGER` | by numeric score (0 / 50 / 100) |
//! | [`Severity`] | `low`, `medium`, `high`, `critical` | by [`Severity::rank`] |
//!
//! Scores on the 0–100 scale map to a [`Vote`] through fixed, inclusive bands:
//! `[0, 40]` → SAFE, `(40, 70]` → WARNING, `(70, 100]` → DANGER. Anything
//! outside `[0, 100]` (including NaN) falls back to WARNING.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound (inclusive) of the SAFE band on the 0–100 scale.
pub const SAFE_UPPER_BOUND: f64 = 40.0;

/// Upper bound (inclusive) of the WARNING band on the 0–100 scale.
pub const WARNING_UPPER_BOUND: f64 = 70.0;

/// Lower bound (inclusive) of the DANGER band on the 0–100 scale.
pub const DANGER_LOWER_BOUND: f64 = 71.0;

/// Categorical vote cast by an agent, also used as the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vote {
    Safe,
    Warning,
    Danger,
}

impl Vote {
    /// Numeric anchor used by consensus blending: SAFE=0, WARNING=50, DANGER=100.
    pub fn numeric(self) -> f64 {
        match self {
            Vote::Safe => 0.0,
            Vote::Warning => 50.0,
            Vote::Danger => 100.0,
        }
    }

    /// Map a 0–100 score onto its verdict band. Scores outside every band,
    /// including the fractional gaps between them, count as WARNING.
    pub fn from_score(score: f64) -> Self {
        if !(0.0..=100.0).contains(&score) {
            return Vote::Warning;
        }
        if score <= SAFE_UPPER_BOUND {
            Vote::Safe
        } else if score >= DANGER_LOWER_BOUND {
            Vote::Danger
        } else {
            Vote::Warning
        }
    }

    /// Map a 0.0–1.0 risk onto a vote using the specialist fusion thresholds.
    pub fn from_risk(risk: f64, warning_at: f64, danger_at: f64) -> Self {
        if risk >= danger_at {
            Vote::Danger
        } else if risk >= warning_at {
            Vote::Warning
        } else {
            Vote::Safe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Safe => "SAFE",
            Vote::Warning => "WARNING",
            Vote::Danger => "DANGER",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised value: {0}")]
pub struct ParseEnumError(pub String);

impl FromStr for Vote {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Ok(Vote::Safe),
            "WARNING" => Ok(Vote::Warning),
            "DANGER" => Ok(Vote::Danger),
            _ => Err(ParseEnumError(s.to_string())),
        }
    }
}

/// Severity of a finding. Compared by ordinal rank, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(ParseEnumError(s.to_string())),
        }
    }
}
