use std::time::Instant;

use super::key::ModelKey;
use crate::backend::{ModelInfo, ScoringBackend};
use crate::scoring::NormalizationStrategy;

/// A fully initialized model/tokenizer pair.
///
/// Built once per successful load and never mutated afterwards. The
/// normalization strategy is resolved at load time so every batch scored
/// under this key is normalized the same way.
pub struct CachedModelEntry<B: ScoringBackend> {
    key: ModelKey,
    model: B::Model,
    tokenizer: B::Tokenizer,
    info: ModelInfo,
    strategy: NormalizationStrategy,
    loaded_at: Instant,
}

impl<B: ScoringBackend> CachedModelEntry<B> {
    pub(crate) fn new(
        key: ModelKey,
        model: B::Model,
        tokenizer: B::Tokenizer,
        info: ModelInfo,
        strategy: NormalizationStrategy,
    ) -> Self {
        Self {
            key,
            model,
            tokenizer,
            info,
            strategy,
            loaded_at: Instant::now(),
        }
    }

    #[inline]
    pub fn key(&self) -> &ModelKey {
        &self.key
    }

    #[inline]
    pub fn model(&self) -> &B::Model {
        &self.model
    }

    #[inline]
    pub fn tokenizer(&self) -> &B::Tokenizer {
        &self.tokenizer
    }

    /// Output metadata declared by the model.
    #[inline]
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    #[inline]
    pub fn strategy(&self) -> NormalizationStrategy {
        self.strategy
    }

    #[inline]
    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }
}

impl<B: ScoringBackend> std::fmt::Debug for CachedModelEntry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedModelEntry")
            .field("key", &self.key)
            .field("info", &self.info)
            .field("strategy", &self.strategy)
            .field("age", &self.loaded_at.elapsed())
            .finish()
    }
}
