use thiserror::Error;

use super::key::ModelKey;
use crate::backend::BackendError;

/// Model cache failures.
///
/// `Clone` so one failed load can be handed to every waiter on that key.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("invalid model key: {reason}")]
    InvalidKey { reason: String },

    #[error("failed to load model '{key}': {source}")]
    LoadFailed {
        key: ModelKey,
        #[source]
        source: BackendError,
    },

    #[error("model '{key}' declares unusable output metadata: {reason}")]
    MalformedMetadata { key: ModelKey, reason: String },

    #[error("model '{key}' is not initialized")]
    NotInitialized { key: ModelKey },
}

pub type CacheResult<T> = Result<T, CacheError>;
