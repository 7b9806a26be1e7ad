// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) holding every
// tunable of an analysis run:
// - cross-agent consensus weights and the required quorum
// - specialist fusion weights, overall timeout and placeholder risks
// - message bus protocol tag and history capacity
// - lifecycle event channel capacity
// - logging settings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "sentinel.network/v1";
pub const KIND: &str = "OrchestratorConfig";

/// Top-level Kubernetes-style orchestrator configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// API version (must be "sentinel.network/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "OrchestratorConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: OrchestratorSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorSpec {
    #[serde(default)]
    pub consensus: ConsensusConfig,

    #[serde(default)]
    pub specialists: SpecialistConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Fixed cross-agent weights keyed by agent name
    #[serde(default = "default_agent_weights")]
    pub agent_weights: BTreeMap<String, f64>,

    /// Agents whose vote must be present for a run to complete
    #[serde(default = "default_required_agents")]
    pub required_agents: Vec<String>,

    /// Weight for an agent missing from `agent_weights`
    #[serde(default = "default_unknown_weight")]
    pub default_weight: f64,
}

impl ConsensusConfig {
    pub fn weight_for(&self, agent: &str) -> f64 {
        self.agent_weights
            .get(agent)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistConfig {
    /// Fusion weights keyed by specialist name
    #[serde(default = "default_specialist_weights")]
    pub weights: BTreeMap<String, f64>,

    #[serde(default = "default_unknown_weight")]
    pub default_weight: f64,

    /// Bound on the whole parallel fan-out
    #[serde(default = "default_overall_timeout", with = "humantime_serde")]
    pub overall_timeout: Duration,

    /// Placeholder risk recorded for a unit that errored
    #[serde(default = "default_error_risk")]
    pub error_risk: f64,

    /// Placeholder risk recorded for a unit that timed out
    #[serde(default = "default_timeout_risk")]
    pub timeout_risk: f64,

    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,

    #[serde(default = "default_danger_threshold")]
    pub danger_threshold: f64,
}

impl SpecialistConfig {
    pub fn weight_for(&self, unit: &str) -> f64 {
        self.weights.get(unit).copied().unwrap_or(self.default_weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Deadline for a single subscriber delivery during broadcast.
    #[serde(default = "default_delivery_timeout", with = "humantime_serde")]
    pub delivery_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text or json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_agent_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("sentinel".to_string(), 0.40),
        ("oracle".to_string(), 0.25),
        ("compliance".to_string(), 0.20),
        ("zk_prover".to_string(), 0.15),
    ])
}

fn default_required_agents() -> Vec<String> {
    ["sentinel", "oracle", "compliance", "zk_prover"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_specialist_weights() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("BlockScanner".to_string(), 0.25),
        ("StakeAnalyzer".to_string(), 0.20),
        ("VoteDoctor".to_string(), 0.15),
        ("MempoolSniffer".to_string(), 0.20),
        ("ReplayDetector".to_string(), 0.20),
    ])
}

fn default_unknown_weight() -> f64 {
    0.1
}

fn default_overall_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_error_risk() -> f64 {
    0.10
}

fn default_timeout_risk() -> f64 {
    0.15
}

fn default_warning_threshold() -> f64 {
    0.4
}

fn default_danger_threshold() -> f64 {
    0.7
}

fn default_protocol() -> String {
    crate::domain::envelope::PROTOCOL_VERSION.to_string()
}

fn default_history_capacity() -> usize {
    100
}

fn default_delivery_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_event_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            agent_weights: default_agent_weights(),
            required_agents: default_required_agents(),
            default_weight: default_unknown_weight(),
        }
    }
}

impl Default for SpecialistConfig {
    fn default() -> Self {
        Self {
            weights: default_specialist_weights(),
            default_weight: default_unknown_weight(),
            overall_timeout: default_overall_timeout(),
            error_risk: default_error_risk(),
            timeout_risk: default_timeout_risk(),
            warning_threshold: default_warning_threshold(),
            danger_threshold: default_danger_threshold(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            history_capacity: default_history_capacity(),
            delivery_timeout: default_delivery_timeout(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "sentinel-orchestrator".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: OrchestratorSpec::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SENTINEL_CONFIG_PATH environment variable
    /// 2. ./sentinel-config.yaml (working directory)
    /// 3. ~/.sentinel/config.yaml (user home)
    /// 4. /etc/sentinel/config.yaml (system, Unix) or C:\ProgramData\Sentinel\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SENTINEL_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./sentinel-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".sentinel").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/sentinel/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Sentinel\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails hard when missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SENTINEL_SPECIALIST_TIMEOUT") {
            match humantime_serde::re::humantime::parse_duration(&val) {
                Ok(timeout) => {
                    tracing::info!("Environment override: SENTINEL_SPECIALIST_TIMEOUT={}", val);
                    self.spec.specialists.overall_timeout = timeout;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SENTINEL_SPECIALIST_TIMEOUT: '{}'. Expected a duration like '10s'. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup("SENTINEL_BUS_HISTORY") {
            match val.parse::<usize>() {
                Ok(capacity) => {
                    tracing::info!("Environment override: SENTINEL_BUS_HISTORY={}", capacity);
                    self.spec.bus.history_capacity = capacity;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SENTINEL_BUS_HISTORY: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup("SENTINEL_LOG_LEVEL") {
            tracing::info!("Environment override: SENTINEL_LOG_LEVEL={}", val);
            self.spec.observability.log_level = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.trim().is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let consensus = &self.spec.consensus;
        validate_weights("spec.consensus.agent_weights", &consensus.agent_weights)?;
        if consensus.default_weight < 0.0 {
            anyhow::bail!("spec.consensus.default_weight cannot be negative");
        }
        for agent in &consensus.required_agents {
            if !consensus.agent_weights.contains_key(agent) {
                anyhow::bail!(
                    "Required agent '{}' has no entry in spec.consensus.agent_weights",
                    agent
                );
            }
        }

        let specialists = &self.spec.specialists;
        validate_weights("spec.specialists.weights", &specialists.weights)?;
        if specialists.default_weight < 0.0 {
            anyhow::bail!("spec.specialists.default_weight cannot be negative");
        }
        if specialists.overall_timeout.is_zero() {
            anyhow::bail!("spec.specialists.overall_timeout must be greater than zero");
        }
        for (field, value) in [
            ("error_risk", specialists.error_risk),
            ("timeout_risk", specialists.timeout_risk),
            ("warning_threshold", specialists.warning_threshold),
            ("danger_threshold", specialists.danger_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("spec.specialists.{} must be within [0, 1], got {}", field, value);
            }
        }
        if specialists.warning_threshold > specialists.danger_threshold {
            anyhow::bail!("spec.specialists.warning_threshold cannot exceed danger_threshold");
        }

        if self.spec.bus.protocol.trim().is_empty() {
            anyhow::bail!("spec.bus.protocol cannot be empty");
        }
        if self.spec.bus.history_capacity == 0 {
            anyhow::bail!("spec.bus.history_capacity must be greater than zero");
        }
        if self.spec.bus.delivery_timeout.is_zero() {
            anyhow::bail!("spec.bus.delivery_timeout must be greater than zero");
        }
        if self.spec.events.capacity == 0 {
            anyhow::bail!("spec.events.capacity must be greater than zero");
        }

        Ok(())
    }
}

fn validate_weights(field: &str, weights: &BTreeMap<String, f64>) -> anyhow::Result<()> {
    if let Some((name, weight)) = weights.iter().find(|(_, w)| **w < 0.0 || w.is_nan()) {
        anyhow::bail!("{}: weight for '{}' must be non-negative, got {}", field, name, weight);
    }
    if !weights.values().any(|w| *w > 0.0) {
        anyhow::bail!("{}: at least one weight must be positive", field);
    }
    Ok(())
}
