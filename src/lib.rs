//! Crossrank library crate (used by the evaluation binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Reranking
//! - [`Reranker`], [`RerankerConfig`], [`RerankOptions`] - Top-K cross-encoder reranking
//! - [`Document`], [`ScoredDocument`] - Inputs and outputs (caller fields preserved)
//!
//! ## Model Cache
//! - [`ModelCache`], [`ModelCacheHandle`], [`ModelKey`] - Shared, load-once model registry
//!
//! ## Scoring
//! - [`NormalizationStrategy`], [`ScoringPipeline`] - Logit normalization and batching
//! - [`ScoringBackend`], [`CandleBackend`] - Model boundary and its candle implementation
//!
//! ## Evaluation
//! - [`evaluate`], [`calculate_average_metrics`], [`Evaluator`] - MRR / NDCG / Precision / Recall
//!
//! ## Test/Mock Support
//! [`MockBackend`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod backend;
pub mod cache;
pub mod config;
pub mod constants;
pub mod evaluation;
pub mod reranker;
pub mod scoring;

#[cfg(any(test, feature = "mock"))]
pub use backend::MockBackend;
pub use backend::{
    BackendError, CandleBackend, Logits, ModelInfo, QueryPassagePair, ScoringBackend,
};
pub use cache::{CacheError, CachedModelEntry, ModelCache, ModelCacheHandle, ModelKey};
pub use config::{Config, ConfigError};
pub use constants::{DEFAULT_BATCH_SIZE, DEFAULT_K_VALUES, DEFAULT_MAX_SEQ_LEN, DEFAULT_TOP_K};
pub use evaluation::{
    AverageMetrics, AverageOutcome, EvalQuery, EvaluationError, EvaluationReport, Evaluator,
    JudgedDocument, Metric, MetricSet, QueryEvaluation, RankedPassage, calculate_all_metrics,
    calculate_average_metrics, evaluate,
};
pub use reranker::{Document, RerankError, RerankOptions, Reranker, RerankerConfig, ScoredDocument};
pub use scoring::{NormalizationStrategy, ScoringError, ScoringPipeline};
