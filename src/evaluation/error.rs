use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Averages were requested but no query produced a ranking.
    #[error("no valid results: {error_queries} of {total_queries} queries failed")]
    NoValidResults {
        total_queries: usize,
        error_queries: usize,
    },

    #[error("failed to read dataset {path}: {reason}")]
    DatasetRead { path: PathBuf, reason: String },

    #[error("failed to parse dataset {path}: {reason}")]
    DatasetParse { path: PathBuf, reason: String },
}
