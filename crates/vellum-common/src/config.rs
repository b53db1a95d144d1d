//! Pipeline configuration.
//!
//! Every field has a default, so an empty JSON object (`{}`) is a valid
//! configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bound on layout retries before a constraint is declared runaway.
pub const DEFAULT_MAX_LAYOUT_RETRIES: usize = 500;

/// Errors produced while loading a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration was not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field held a value outside its accepted range.
    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Tunables shared by the paint, render and layout crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Layout passes allowed within one `update_layout` call before the
    /// constraint is considered stuck in a cycle.
    pub max_layout_retries: usize,
    /// Whether new drawables keep their output element on disposal.
    pub keep_elements: bool,
    /// Maximum number of recycled gradient stop proxies kept per block.
    pub stop_pool_capacity: usize,
    /// Maximum number of recycled change intervals kept per surface.
    pub interval_pool_capacity: usize,
    /// Whether the output document records a mutation journal.
    pub journal_mutations: bool,
    /// Whether recoverable invariant violations also trip debug assertions.
    pub strict_assertions: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_layout_retries: DEFAULT_MAX_LAYOUT_RETRIES,
            keep_elements: false,
            stop_pool_capacity: 64,
            interval_pool_capacity: 128,
            journal_mutations: false,
            strict_assertions: true,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`PipelineConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_layout_retries == 0 {
            return Err(ConfigError::Invalid {
                field: "max-layout-retries",
                reason: "must allow at least one layout pass".to_string(),
            });
        }
        Ok(())
    }
}
