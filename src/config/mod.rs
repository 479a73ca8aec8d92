//! Environment-backed configuration.
//!
//! `CROSSRANK_MODEL` is required; everything else has a default. Override
//! with `CROSSRANK_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::cache::ModelKey;
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_K_VALUES, DEFAULT_MAX_SEQ_LEN, DEFAULT_MODEL_ROOT, DEFAULT_TOP_K,
};

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model to rerank with (hub-style id or directory path).
    pub model: ModelKey,

    /// Directory searched for model folders. Default: `./models`.
    pub model_root: PathBuf,

    /// Results per rerank call. Default: `4`.
    pub top_k: usize,

    /// Pairs per inference call. Default: `128`.
    pub batch_size: usize,

    /// Token limit per (query, passage) pair. Default: `512`.
    pub max_seq_len: usize,

    /// Evaluation cutoffs. Default: `1,3,5,10`.
    pub k_values: Vec<usize>,

    /// JSON evaluation dataset.
    pub dataset_path: Option<PathBuf>,
}

impl Config {
    const ENV_MODEL: &'static str = "CROSSRANK_MODEL";
    const ENV_MODEL_ROOT: &'static str = "CROSSRANK_MODEL_ROOT";
    const ENV_TOP_K: &'static str = "CROSSRANK_TOP_K";
    const ENV_BATCH_SIZE: &'static str = "CROSSRANK_BATCH_SIZE";
    const ENV_MAX_SEQ_LEN: &'static str = "CROSSRANK_MAX_SEQ_LEN";
    const ENV_K_VALUES: &'static str = "CROSSRANK_K_VALUES";
    const ENV_DATASET: &'static str = "CROSSRANK_DATASET";

    /// Defaults for everything except the model key.
    pub fn new(model: impl Into<ModelKey>) -> Self {
        Self {
            model: model.into(),
            model_root: PathBuf::from(DEFAULT_MODEL_ROOT),
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            k_values: DEFAULT_K_VALUES.to_vec(),
            dataset_path: None,
        }
    }

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let model = Self::parse_optional_string_from_env(Self::ENV_MODEL)
            .map(ModelKey::from)
            .ok_or(ConfigError::MissingEnvVar {
                name: Self::ENV_MODEL,
            })?;

        let defaults = Self::new(model);

        let model_root = Self::parse_optional_string_from_env(Self::ENV_MODEL_ROOT)
            .map(PathBuf::from)
            .unwrap_or(defaults.model_root);
        let top_k = Self::parse_usize_from_env(Self::ENV_TOP_K, defaults.top_k)?;
        let batch_size = Self::parse_positive_from_env(Self::ENV_BATCH_SIZE, defaults.batch_size)?;
        let max_seq_len =
            Self::parse_positive_from_env(Self::ENV_MAX_SEQ_LEN, defaults.max_seq_len)?;
        let k_values = Self::parse_k_values_from_env(defaults.k_values)?;
        let dataset_path =
            Self::parse_optional_string_from_env(Self::ENV_DATASET).map(PathBuf::from);

        Ok(Self {
            model: defaults.model,
            model_root,
            top_k,
            batch_size,
            max_seq_len,
            k_values,
            dataset_path,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_blank() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_MODEL,
            });
        }

        if self.batch_size == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_BATCH_SIZE,
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }

        if self.model_root.exists() && !self.model_root.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.model_root.clone(),
            });
        }

        if let Some(ref path) = self.dataset_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_usize(name: &'static str, value: &str) -> Result<usize, ConfigError> {
        value
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidNumber {
                name,
                value: value.to_string(),
                source: e,
            })
    }

    fn parse_usize_from_env(var_name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => Self::parse_usize(var_name, &value),
            None => Ok(default),
        }
    }

    fn parse_positive_from_env(
        var_name: &'static str,
        default: usize,
    ) -> Result<usize, ConfigError> {
        let value = Self::parse_usize_from_env(var_name, default)?;
        if value == 0 {
            return Err(ConfigError::OutOfRange {
                name: var_name,
                value: value.to_string(),
                reason: "must be at least 1",
            });
        }
        Ok(value)
    }

    fn parse_k_values_from_env(default: Vec<usize>) -> Result<Vec<usize>, ConfigError> {
        let Some(raw) = Self::parse_optional_string_from_env(Self::ENV_K_VALUES) else {
            return Ok(default);
        };

        raw.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self::parse_usize(Self::ENV_K_VALUES, v))
            .collect()
    }
}
