// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::engine::settings::{
    DEFAULT_MIN_QUALITY_SCORE, DEFAULT_OVERHEAD_FACTOR, DEFAULT_SPIKE_FACTOR, TranscodeSettings,
};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite number of at least 1.0, got {value}")]
    InvalidFactor { name: &'static str, value: f64 },

    #[error("min_score must be between 0 and 100, got {0}")]
    ScoreOutOfRange(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Re-encode when the source bitrate exceeds base * overhead_factor
    #[serde(default = "default_overhead_factor")]
    pub overhead_factor: f64,

    /// Peak bitrate allowed above target, for encoders with a rate ceiling
    #[serde(default = "default_spike_factor")]
    pub spike_factor: f64,

    /// Minimum VMAF harmonic mean for an encode to be kept
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Verify every encode with VMAF
    #[serde(default)]
    pub check_quality: bool,

    /// Replace originals instead of saving `<name>.optimal.mp4` alongside
    #[serde(default)]
    pub replace_existing: bool,

    /// Encode with libx265 instead of a hardware encoder
    #[serde(default)]
    pub use_cpu: bool,

    /// Re-process files that already have an optimal version
    #[serde(default)]
    pub overwrite: bool,

    /// Outcome log location (defaults to outcomes.jsonl next to the config file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_log: Option<PathBuf>,
}

fn default_overhead_factor() -> f64 {
    DEFAULT_OVERHEAD_FACTOR
}

fn default_spike_factor() -> f64 {
    DEFAULT_SPIKE_FACTOR
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_QUALITY_SCORE
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            overhead_factor: default_overhead_factor(),
            spike_factor: default_spike_factor(),
            min_score: default_min_score(),
        }
    }
}

/// Switches given on the command line; each one can only turn a config default on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub check_quality: bool,
    pub replace_existing: bool,
    pub use_cpu: bool,
    pub overwrite: bool,
}

impl Config {
    /// Directory holding config.toml and the default outcome log
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("vidshrink")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("vidshrink")
        };

        Ok(config_dir)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn default_outcome_log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("outcomes.jsonl"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // Not fatal: the directory may be read-only
            if let Err(e) = config.save() {
                warn!("Could not create default config file: {:#}", e);
                warn!("Using built-in defaults. Run 'vidshrink init-config' to create a config file.");
            }

            Ok(config)
        }
    }

    /// Read, parse and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.quality;
        if !q.overhead_factor.is_finite() || q.overhead_factor < 1.0 {
            return Err(ConfigError::InvalidFactor {
                name: "overhead_factor",
                value: q.overhead_factor,
            });
        }
        if !q.spike_factor.is_finite() || q.spike_factor < 1.0 {
            return Err(ConfigError::InvalidFactor {
                name: "spike_factor",
                value: q.spike_factor,
            });
        }
        if !(0.0..=100.0).contains(&q.min_score) {
            return Err(ConfigError::ScoreOutOfRange(q.min_score));
        }
        Ok(())
    }

    /// Whether software encoding was requested by flag or config
    pub fn use_cpu(&self, flags: &RunFlags) -> bool {
        flags.use_cpu || self.defaults.use_cpu
    }

    /// Merge command-line flags over the config file
    pub fn transcode_settings(&self, flags: &RunFlags) -> TranscodeSettings {
        TranscodeSettings {
            overhead_factor: self.quality.overhead_factor,
            spike_factor: self.quality.spike_factor,
            min_quality_score: self.quality.min_score,
            check_quality: flags.check_quality || self.defaults.check_quality,
            replace_existing: flags.replace_existing || self.defaults.replace_existing,
            overwrite: flags.overwrite || self.defaults.overwrite,
        }
    }

    /// Outcome log path: explicit override, then config, then the default location
    pub fn outcome_log_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        match override_path.or(self.defaults.outcome_log.as_deref()) {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_outcome_log_path(),
        }
    }
}
