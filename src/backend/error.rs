use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`ScoringBackend`](super::ScoringBackend).
///
/// Payloads are plain strings so the error can be cloned out to every caller
/// waiting on the same model load.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("failed to load tokenizer: {reason}")]
    TokenizerLoadFailed { reason: String },

    #[error("{device} device unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("invalid model output: {reason}")]
    InvalidOutput { reason: String },
}

impl From<candle_core::Error> for BackendError {
    fn from(err: candle_core::Error) -> Self {
        BackendError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
