use thiserror::Error;

use crate::cache::{CacheError, ModelKey};
use crate::scoring::ScoringError;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("model cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("document {index} has no extractable text: {reason}")]
    MalformedDocument { index: usize, reason: String },
}

impl RerankError {
    /// `true` when the model was never initialized with [`Reranker::initialize`](super::Reranker::initialize).
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, RerankError::Cache(CacheError::NotInitialized { .. }))
    }

    /// The key named by a load or initialization failure.
    pub fn model_key(&self) -> Option<&ModelKey> {
        match self {
            RerankError::Cache(
                CacheError::LoadFailed { key, .. }
                | CacheError::MalformedMetadata { key, .. }
                | CacheError::NotInitialized { key },
            ) => Some(key),
            _ => None,
        }
    }
}
