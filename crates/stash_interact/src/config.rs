//! Interaction configuration
//!
//! # Example Config File
//!
//! ```toml
//! tap_threshold = 0.25     # seconds; shorter presses are taps
//! hold_duration = 0.75     # seconds until a hold completes
//! inventory_capacity = 30.0
//! storage_capacity = 60.0
//! nested_format = "extended" # or "compact" to drop per-item properties
//! ```

use serde::{Deserialize, Serialize};
use stash_persist::PayloadFormat;
use std::path::Path;
use thiserror::Error;

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Gesture timings and default capacities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Presses released before this many seconds are taps
    pub tap_threshold: f32,
    /// Seconds from press until a hold completes
    pub hold_duration: f32,
    /// Player inventory capacity
    pub inventory_capacity: f32,
    /// Capacity of world containers without a saved capacity
    pub storage_capacity: f32,
    /// Encoding used when a picked-up container is captured into its entry
    ///
    /// Compact drops per-item properties, including the contents of bags
    /// nested inside the picked-up bag.
    pub nested_format: PayloadFormat,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            tap_threshold: 0.25,
            hold_duration: 0.75,
            inventory_capacity: 30.0,
            storage_capacity: 60.0,
            nested_format: PayloadFormat::Extended,
        }
    }
}

impl InteractionConfig {
    /// Parse and validate from TOML
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded interaction config from {}", path.display());
        Ok(config)
    }

    /// Set gesture timings
    pub fn with_timings(mut self, tap_threshold: f32, hold_duration: f32) -> Self {
        self.tap_threshold = tap_threshold;
        self.hold_duration = hold_duration;
        self
    }

    /// Set the nested container encoding
    pub fn with_nested_format(mut self, format: PayloadFormat) -> Self {
        self.nested_format = format;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.tap_threshold > 0.0) {
            return Err(ConfigError::Validation(format!(
                "tap_threshold must be positive, got {}",
                self.tap_threshold
            )));
        }
        if !(self.hold_duration > self.tap_threshold) {
            return Err(ConfigError::Validation(format!(
                "hold_duration ({}) must exceed tap_threshold ({})",
                self.hold_duration, self.tap_threshold
            )));
        }
        for (name, value) in [
            ("inventory_capacity", self.inventory_capacity),
            ("storage_capacity", self.storage_capacity),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
