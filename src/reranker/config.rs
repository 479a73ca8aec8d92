use crate::cache::ModelKey;
use crate::config::Config;
use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_TOP_K};

/// Per-call knobs for [`Reranker::rerank_with`](super::Reranker::rerank_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerankOptions {
    /// Maximum results returned. `0` returns nothing.
    pub top_k: usize,
    /// Pairs per backend call. Must be at least 1.
    pub batch_size: usize,
}

impl Default for RerankOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl RerankOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankerConfig {
    /// Model this reranker scores with.
    pub model: ModelKey,

    /// Defaults used by [`Reranker::rerank`](super::Reranker::rerank).
    pub options: RerankOptions,
}

impl RerankerConfig {
    pub fn new(model: impl Into<ModelKey>) -> Self {
        Self {
            model: model.into(),
            options: RerankOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RerankOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.options.top_k = top_k;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.options.batch_size = batch_size;
        self
    }

    /// Builds the reranker settings from process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            options: RerankOptions {
                top_k: config.top_k,
                batch_size: config.batch_size,
            },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.is_blank() {
            return Err("model key cannot be empty".to_string());
        }
        self.options.validate()
    }
}
