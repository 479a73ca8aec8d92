use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("batch {batch} failed: {source}")]
    Backend {
        batch: usize,
        #[source]
        source: BackendError,
    },

    #[error(
        "batch {batch} returned logits shaped [{rows}, {cols}], expected [{expected_rows}, {expected_cols}]"
    )]
    ShapeMismatch {
        batch: usize,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("invalid model output: {reason}")]
    InvalidModelOutput { reason: String },
}
