//! Configuration management for roompulse
//!
//! Handles loading and validation of `roompulse.toml`. Every section and
//! field is optional; missing values fall back to the defaults below.
//! Validation never stops at the first problem: all violated invariants are
//! collected and reported together in one [`ConfigError::Invalid`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clock::{MS_PER_SEC, is_valid_scale};
use crate::error::ConfigError;
use crate::logging::LogConfig;

/// Environment variable that overrides [`ClockConfig::time_scale`].
pub const TIME_SCALE_ENV: &str = "TIME_SCALE";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Status history retention
    pub retention: RetentionConfig,

    /// Time source settings
    pub clock: ClockConfig,

    /// Logging settings
    pub logging: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(display));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(display, e.to_string()))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))
    }

    /// Validate every section, reporting all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = self.retention.violations();
        violations.extend(self.clock.violations());
        match ConfigError::from_violations(violations) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Two-tier retention settings for the status history.
///
/// Recent samples (within `dense_interval_window_secs` of the latest
/// recording) are kept at `dense_snapshot_interval_secs` spacing; older ones
/// are thinned to `sparse_snapshot_interval_secs` spacing. The combined
/// history never exceeds `max_snapshot_count` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Minimum spacing between admitted dense samples.
    pub dense_snapshot_interval_secs: i64,
    /// How far back from "now" a sample still counts as dense.
    pub dense_interval_window_secs: i64,
    /// Minimum spacing between retained sparse samples.
    pub sparse_snapshot_interval_secs: i64,
    /// Hard cap on sparse + dense history length.
    pub max_snapshot_count: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            dense_snapshot_interval_secs: 1,
            dense_interval_window_secs: 60,
            sparse_snapshot_interval_secs: 60,
            max_snapshot_count: 1000,
        }
    }
}

impl RetentionConfig {
    /// Every violated invariant, in check order. Empty when valid.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut msgs = Vec::new();

        if self.dense_snapshot_interval_secs <= 0 {
            msgs.push("dense_snapshot_interval must be > 0".to_string());
        }
        if self.sparse_snapshot_interval_secs <= 0 {
            msgs.push("sparse_snapshot_interval must be > 0".to_string());
        }
        if self.dense_interval_window_secs < 0 {
            msgs.push("dense_interval_window must be >= 0".to_string());
        }
        if self.max_snapshot_count == 0 {
            msgs.push("max_snapshot_count must be > 0".to_string());
        }
        if self.dense_interval_window_secs < self.dense_snapshot_interval_secs {
            msgs.push("dense_interval_window must be >= dense_snapshot_interval".to_string());
        }
        if self.dense_snapshot_interval_secs > self.sparse_snapshot_interval_secs {
            msgs.push("dense_snapshot_interval must be <= sparse_snapshot_interval".to_string());
        }

        msgs
    }

    /// Validate configuration constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match ConfigError::from_violations(self.violations()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Dense admission spacing in milliseconds.
    #[must_use]
    pub fn dense_interval_ms(&self) -> i64 {
        self.dense_snapshot_interval_secs.saturating_mul(MS_PER_SEC)
    }

    /// Dense window length in milliseconds.
    #[must_use]
    pub fn dense_window_ms(&self) -> i64 {
        self.dense_interval_window_secs.saturating_mul(MS_PER_SEC)
    }

    /// Sparse admission spacing in milliseconds.
    #[must_use]
    pub fn sparse_interval_ms(&self) -> i64 {
        self.sparse_snapshot_interval_secs.saturating_mul(MS_PER_SEC)
    }
}

/// Time source settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Wall-clock acceleration factor (1.0 = real time).
    pub time_scale: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { time_scale: 1.0 }
    }
}

impl ClockConfig {
    /// Every violated invariant. Empty when valid.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        if is_valid_scale(self.time_scale) {
            Vec::new()
        } else {
            vec!["time_scale must be a finite number > 0".to_string()]
        }
    }

    /// The scale to use, preferring an override (normally the value of
    /// [`TIME_SCALE_ENV`]) when it parses to a valid factor.
    #[must_use]
    pub fn effective_time_scale(&self, override_raw: Option<&str>) -> f64 {
        override_raw
            .and_then(parse_time_scale)
            .unwrap_or(self.time_scale)
    }

    /// [`Self::effective_time_scale`] with the process environment.
    #[must_use]
    pub fn time_scale_from_env(&self) -> f64 {
        let raw = std::env::var(TIME_SCALE_ENV).ok();
        self.effective_time_scale(raw.as_deref())
    }
}

/// Parse a time-scale factor, rejecting non-finite and non-positive values.
#[must_use]
pub fn parse_time_scale(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| is_valid_scale(*v))
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected one of: pretty, json")),
        }
    }
}
