//! Configuration loading and typed config structures for the mirroring layer.
//!
//! The configuration lives in `mirror-config.yaml` at the workspace root. It
//! is loaded once at startup into an immutable [`MirrorConfig`] and handed by
//! reference to every component that needs a process-wide default.

use std::path::Path;

use serde::Deserialize;

use crate::binding::MissingSourcePolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    /// Process-wide fallbacks for per-unit binding options.
    #[serde(default)]
    pub defaults: MirrorDefaults,

    /// Settings for the reference host (rosters and experience rules).
    #[serde(default)]
    pub host: HostConfig,
}

impl MirrorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// The four process-wide defaults a binding falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MirrorDefaults {
    /// Whether shadows level up with their source's growth table.
    #[serde(default = "default_true")]
    pub growth: bool,

    /// What to do with a shadow whose source cannot be found at spawn.
    #[serde(default)]
    pub missing_source: MissingSourcePolicy,

    /// Whether a shadow may spawn while its source is alive and deployed.
    #[serde(default = "default_true")]
    pub allow_coexist: bool,

    /// Keep the copied current HP at spawn instead of healing to full.
    #[serde(default)]
    pub copy_current_hp: bool,
}

impl Default for MirrorDefaults {
    fn default() -> Self {
        Self {
            growth: true,
            missing_source: MissingSourcePolicy::default(),
            allow_coexist: true,
            copy_current_hp: false,
        }
    }
}

/// Reference host settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Item slots per unit.
    #[serde(default = "default_item_capacity")]
    pub item_capacity: usize,

    /// Highest level a unit can reach.
    #[serde(default = "default_max_level")]
    pub max_level: u32,

    /// Experience needed for one level.
    #[serde(default = "default_exp_per_level")]
    pub exp_per_level: u32,

    /// Seed for percentage growth rolls.
    #[serde(default = "default_growth_seed")]
    pub growth_seed: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            item_capacity: default_item_capacity(),
            max_level: default_max_level(),
            exp_per_level: default_exp_per_level(),
            growth_seed: default_growth_seed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_item_capacity() -> usize {
    5
}

const fn default_max_level() -> u32 {
    20
}

const fn default_exp_per_level() -> u32 {
    100
}

const fn default_growth_seed() -> u64 {
    42
}
