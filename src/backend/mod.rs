//! Scoring backend boundary.
//!
//! A [`ScoringBackend`] owns everything model-specific: loading weights and
//! tokenizers, turning (query, passage) pairs into features, and running the
//! forward pass. The rest of the crate only sees [`Logits`] and [`ModelInfo`].
//!
//! - [`candle`] runs BERT-style sequence classifiers locally.
//! - [`mock`] is a deterministic in-process backend for tests.

/// Candle (BERT classifier) backend.
pub mod candle;
mod error;
#[cfg(any(test, feature = "mock"))]
/// Deterministic mock backend.
pub mod mock;
mod types;


use async_trait::async_trait;

use crate::cache::ModelKey;

pub use candle::{CandleBackend, CandleModel, EncodedBatch};
pub use error::BackendError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackend, MockModel, MockTokenizer};
pub use types::{Logits, ModelInfo, QueryPassagePair};

#[async_trait]
/// External collaborator producing raw cross-encoder logits.
///
/// Within one `infer` call the output rows must follow the input pair order.
pub trait ScoringBackend: Send + Sync + 'static {
    /// Loaded model weights.
    type Model: Send + Sync + 'static;
    /// Loaded tokenizer.
    type Tokenizer: Send + Sync + 'static;
    /// Model-ready inputs for one batch.
    type Features: Send + 'static;

    /// Loads the model identified by `key`.
    async fn load_model(&self, key: &ModelKey) -> Result<Self::Model, BackendError>;

    /// Loads the tokenizer paired with `key`.
    async fn load_tokenizer(&self, key: &ModelKey) -> Result<Self::Tokenizer, BackendError>;

    /// Declared output width and labels.
    fn model_info(&self, model: &Self::Model) -> ModelInfo;

    /// Paired tokenization (truncation/padding is the backend's concern).
    ///
    /// CPU-heavy implementations should move off the async executor.
    async fn tokenize(
        &self,
        tokenizer: &Self::Tokenizer,
        pairs: &[QueryPassagePair<'_>],
    ) -> Result<Self::Features, BackendError>;

    /// Forward pass returning `[pairs, num_labels]` logits.
    async fn infer(
        &self,
        model: &Self::Model,
        features: Self::Features,
    ) -> Result<Logits, BackendError>;
}
