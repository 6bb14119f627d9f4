use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent::{RunnerOptions, MAX_SPEED, MIN_SPEED};
use crate::strategy::{StrategyKind, StrategyOptions};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("{0}")]
    Invalid(String),
}

/// Agent settings loaded from TOML. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub explain_moves: bool,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub max_moves: Option<u64>,
    #[serde(default = "default_search_depth")]
    pub search_depth: Option<u64>,
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_strategy() -> String {
    StrategyKind::default().id().to_string()
}
fn default_speed() -> f64 {
    crate::agent::DEFAULT_SPEED
}
fn default_search_depth() -> Option<u64> {
    StrategyOptions::default().search_depth
}
fn default_risk_tolerance() -> f64 {
    StrategyOptions::default().risk_tolerance
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            speed: default_speed(),
            explain_moves: false,
            seed: 0,
            max_moves: None,
            search_depth: default_search_depth(),
            risk_tolerance: default_risk_tolerance(),
            log_level: default_log_level(),
        }
    }
}

impl AgentConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let config: AgentConfig = toml::from_str(content)
            .map_err(|source| ConfigError::Parse { path: source_path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Collect every problem at once. An unknown strategy is not an error:
    /// it falls back to the default when resolved.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !self.speed.is_finite() || self.speed <= 0.0 {
            errors.push(format!(
                "speed must be > 0 (clamped to {MIN_SPEED}-{MAX_SPEED}), got {}. Example: speed = 2.0",
                self.speed
            ));
        }

        if self.max_moves == Some(0) {
            errors.push("max_moves must be > 0 when set. Example: max_moves = 500".to_string());
        }

        if self.search_depth == Some(0) {
            errors.push("search_depth must be > 0 when set. Example: search_depth = 4".to_string());
        }

        if !(0.0..=1.0).contains(&self.risk_tolerance) {
            errors.push(format!(
                "risk_tolerance must be within 0.0-1.0, got {}. Example: risk_tolerance = 0.7",
                self.risk_tolerance
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("\n")))
        }
    }

    /// Resolved strategy; unknown names fall back to the default with a warning.
    pub fn strategy_kind(&self) -> StrategyKind { StrategyKind::resolve(&self.strategy) }

    pub fn strategy_options(&self) -> StrategyOptions {
        StrategyOptions { seed: self.seed, search_depth: self.search_depth, risk_tolerance: self.risk_tolerance }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions { speed: self.speed, explain_moves: self.explain_moves, max_moves: self.max_moves }
    }
}
