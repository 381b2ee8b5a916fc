//! Top-level configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EvidenceConfig, TaskConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`ATLAS_*`)
/// 2. Project config (`atlas.toml` in the working directory)
/// 3. User config (`~/.atlas/config.toml`)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AtlasConfig {
    pub task: TaskConfig,
    pub evidence: EvidenceConfig,
}

impl AtlasConfig {
    /// Load configuration with layered resolution and validate the result.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config
        if let Some(user_config_path) = user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(err @ ConfigError::ParseError { .. }) => return Err(err),
                    Err(_) => {
                        // Non-parse errors from the user layer fall back to defaults.
                    }
                }
            }
        }

        // Project config
        let project_config_path = root.join("atlas.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Highest priority: environment variables
        Self::apply_env_overrides(&mut config);

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AtlasConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &AtlasConfig) -> Result<(), ConfigError> {
        if config.task.period_set().is_none() {
            return Err(ConfigError::ValidationFailed {
                field: "task.periods".to_string(),
                message: "must be a non-empty, ordered, non-overlapping list".to_string(),
            });
        }
        for name in &config.task.categories {
            if crate::types::EvidenceCategory::parse(name).is_none() {
                return Err(ConfigError::ValidationFailed {
                    field: "task.categories".to_string(),
                    message: format!("unknown category {name:?}"),
                });
            }
        }
        for &month in &config.task.months {
            if !(1..=12).contains(&month) {
                return Err(ConfigError::ValidationFailed {
                    field: "task.months".to_string(),
                    message: format!("month {month} outside 1-12"),
                });
            }
        }
        let threshold = config.evidence.effective_documented_threshold();
        if threshold <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "evidence.documented_weight_threshold".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        let cutoff = config.evidence.effective_extralimital_cutoff_m();
        if cutoff <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "evidence.extralimital_cutoff_m".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        let tolerance = config.evidence.effective_error_tolerance_pct();
        if !(0.0..=100.0).contains(&tolerance) {
            return Err(ConfigError::ValidationFailed {
                field: "evidence.error_tolerance_pct".to_string(),
                message: "must be between 0 and 100".to_string(),
            });
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut AtlasConfig, path: &Path) -> Result<(), ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let file_config: AtlasConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a value.
    fn merge(base: &mut AtlasConfig, other: &AtlasConfig) {
        if !other.task.periods.is_empty() {
            base.task.periods = other.task.periods.clone();
        }
        if !other.task.categories.is_empty() {
            base.task.categories = other.task.categories.clone();
        }
        if !other.task.months.is_empty() {
            base.task.months = other.task.months.clone();
        }
        if other.task.use_observations.is_some() {
            base.task.use_observations = other.task.use_observations;
        }
        if other.task.use_opinions.is_some() {
            base.task.use_opinions = other.task.use_opinions;
        }
        if other.task.use_legacy.is_some() {
            base.task.use_legacy = other.task.use_legacy;
        }

        if other.evidence.documented_weight_threshold.is_some() {
            base.evidence.documented_weight_threshold =
                other.evidence.documented_weight_threshold;
        }
        if other.evidence.extralimital_cutoff_m.is_some() {
            base.evidence.extralimital_cutoff_m = other.evidence.extralimital_cutoff_m;
        }
        if other.evidence.error_tolerance_pct.is_some() {
            base.evidence.error_tolerance_pct = other.evidence.error_tolerance_pct;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `ATLAS_DOCUMENTED_THRESHOLD`, `ATLAS_EXTRALIMITAL_CUTOFF_M`, etc.
    fn apply_env_overrides(config: &mut AtlasConfig) {
        if let Ok(val) = std::env::var("ATLAS_DOCUMENTED_THRESHOLD") {
            if let Ok(v) = val.parse::<f64>() {
                config.evidence.documented_weight_threshold = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ATLAS_EXTRALIMITAL_CUTOFF_M") {
            if let Ok(v) = val.parse::<f64>() {
                config.evidence.extralimital_cutoff_m = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ATLAS_ERROR_TOLERANCE_PCT") {
            if let Ok(v) = val.parse::<f64>() {
                config.evidence.error_tolerance_pct = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ATLAS_USE_OBSERVATIONS") {
            if let Ok(v) = val.parse::<bool>() {
                config.task.use_observations = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ATLAS_USE_OPINIONS") {
            if let Ok(v) = val.parse::<bool>() {
                config.task.use_opinions = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ATLAS_USE_LEGACY") {
            if let Ok(v) = val.parse::<bool>() {
                config.task.use_legacy = Some(v);
            }
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Returns the user config path: `~/.atlas/config.toml`.
fn user_config_path() -> Option<std::path::PathBuf> {
    home_dir().map(|h| h.join(".atlas").join("config.toml"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}
