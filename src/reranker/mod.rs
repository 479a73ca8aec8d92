//! Cross-encoder reranking entry point.
//!
//! [`Reranker::rerank`] scores every document against the query with the
//! configured model, sorts by descending score and returns the top K. Equal
//! scores keep their input order (`corpus_id` is the explicit tie-break), so
//! a deterministic backend always yields the same ranking.

pub mod config;
pub mod document;
pub mod error;


pub use config::{RerankOptions, RerankerConfig};
pub use document::{Document, ScoredDocument};
pub use error::RerankError;

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::backend::{QueryPassagePair, ScoringBackend};
use crate::cache::{CachedModelEntry, ModelCacheHandle, ModelKey};
use crate::scoring::ScoringPipeline;

/// Reranks documents with one model from a shared [`ModelCacheHandle`].
pub struct Reranker<B: ScoringBackend> {
    cache: ModelCacheHandle<B>,
    config: RerankerConfig,
}

impl<B: ScoringBackend> std::fmt::Debug for Reranker<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl<B: ScoringBackend> Reranker<B> {
    /// Creates a reranker; the model is not loaded until [`initialize`](Self::initialize).
    pub fn new(cache: ModelCacheHandle<B>, config: RerankerConfig) -> Result<Self, RerankError> {
        config
            .validate()
            .map_err(|reason| RerankError::InvalidConfig { reason })?;

        Ok(Self { cache, config })
    }

    #[inline]
    pub fn model(&self) -> &ModelKey {
        &self.config.model
    }

    #[inline]
    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    #[inline]
    pub fn cache(&self) -> &ModelCacheHandle<B> {
        &self.cache
    }

    /// Loads (or reuses) the configured model.
    pub async fn initialize(&self) -> Result<Arc<CachedModelEntry<B>>, RerankError> {
        Ok(self.cache.ensure_loaded(&self.config.model).await?)
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.get(&self.config.model).is_some()
    }

    /// Reranks with the configured [`RerankOptions`].
    pub async fn rerank(
        &self,
        query: &str,
        documents: Vec<Document>,
    ) -> Result<Vec<ScoredDocument>, RerankError> {
        self.rerank_with(query, documents, self.config.options).await
    }

    /// Reranks with explicit options.
    ///
    /// Returns `min(top_k, documents.len())` results in non-increasing score
    /// order. An empty input returns immediately without touching the cache.
    pub async fn rerank_with(
        &self,
        query: &str,
        documents: Vec<Document>,
        options: RerankOptions,
    ) -> Result<Vec<ScoredDocument>, RerankError> {
        options
            .validate()
            .map_err(|reason| RerankError::InvalidConfig { reason })?;

        if documents.is_empty() {
            debug!("No documents to rerank");
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let total = documents.len();
        let scores = self.score_documents(query, &documents, options.batch_size).await?;

        let mut ranked: Vec<ScoredDocument> = documents
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(corpus_id, (document, score))| ScoredDocument::new(corpus_id, score, document))
            .collect();

        ranked.sort_by(by_score_then_corpus_id);
        ranked.truncate(options.top_k);

        info!(
            model = %self.config.model,
            documents = total,
            returned = ranked.len(),
            top_score = ranked.first().map(|d| d.score),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reranking complete"
        );

        Ok(ranked)
    }

    /// Scores documents in input order without sorting or truncation.
    pub async fn predict(
        &self,
        query: &str,
        documents: &[Document],
    ) -> Result<Vec<f64>, RerankError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        self.score_documents(query, documents, self.config.options.batch_size)
            .await
    }

    async fn score_documents(
        &self,
        query: &str,
        documents: &[Document],
        batch_size: usize,
    ) -> Result<Vec<f64>, RerankError> {
        let entry = self.cache.wait_ready(&self.config.model).await?;

        let pairs = documents
            .iter()
            .enumerate()
            .map(|(index, document)| {
                document
                    .text()
                    .map(|passage| QueryPassagePair::new(query, passage))
                    .ok_or_else(|| RerankError::MalformedDocument {
                        index,
                        reason: "record has no string `text` field".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, RerankError>>()?;

        debug!(
            model = %self.config.model,
            strategy = %entry.strategy(),
            pairs = pairs.len(),
            batch_size,
            "Scoring query-passage pairs"
        );

        let pipeline = ScoringPipeline::new(self.cache.backend(), &entry);
        Ok(pipeline.score(&pairs, batch_size).await?)
    }
}

/// Descending score; equal scores keep ascending `corpus_id`.
fn by_score_then_corpus_id(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.corpus_id.cmp(&b.corpus_id))
}
