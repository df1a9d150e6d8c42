//! Demo configuration.
//!
//! Loaded from a TOML file, then overridden by CLI flags.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use vclock_runtime::{RuntimeConfig, Topology, TopologySpec};

use crate::scenario;

/// Demo configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Pacing and timeouts.
    pub runtime: RuntimeConfig,

    /// Processes, channels and scripts; the built-in scenario when absent.
    pub scenario: Option<TopologySpec>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Log format (pretty, json, compact).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl DemoConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// The default configuration with the built-in scenario spelled out,
    /// as a starting point for a config file.
    pub fn example() -> Self {
        Self {
            scenario: Some(scenario::builtin()),
            ..Self::default()
        }
    }

    /// Merges CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &super::CliArgs) {
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }

        if args.json_logs {
            self.logging.format = "json".to_string();
        }

        if let Some(deadline) = args.deadline_ms {
            self.runtime.join_timeout_ms = Some(deadline);
        }

        if let Some(delay) = args.delay_ms {
            self.runtime.action_delay_ms = delay;
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        if self.runtime.event_buffer == 0 {
            anyhow::bail!("runtime.event_buffer must be greater than zero");
        }

        if self.runtime.join_timeout_ms == Some(0) {
            anyhow::bail!("runtime.join_timeout_ms must be greater than zero");
        }

        if self.runtime.receive_timeout_ms == Some(0) {
            anyhow::bail!("runtime.receive_timeout_ms must be greater than zero");
        }

        Ok(())
    }

    /// Validates the scenario and returns the topology to run.
    pub fn topology(&self) -> anyhow::Result<Topology> {
        let spec = self.scenario.clone().unwrap_or_else(scenario::builtin);
        spec.build().context("Invalid scenario")
    }
}
