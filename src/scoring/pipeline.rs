use std::time::Instant;

use tracing::debug;

use super::error::ScoringError;
use crate::backend::{Logits, QueryPassagePair, ScoringBackend};
use crate::cache::CachedModelEntry;

/// Batched scoring against one loaded model.
///
/// Pairs are cut into contiguous chunks of at most `batch_size`, each chunk
/// is tokenized and run through the backend, and normalized chunk scores are
/// concatenated in chunk order. Any failing chunk fails the whole call.
pub struct ScoringPipeline<'a, B: ScoringBackend> {
    backend: &'a B,
    entry: &'a CachedModelEntry<B>,
}

impl<'a, B: ScoringBackend> ScoringPipeline<'a, B> {
    pub fn new(backend: &'a B, entry: &'a CachedModelEntry<B>) -> Self {
        Self { backend, entry }
    }

    /// Returns one score per pair, in input order.
    pub async fn score(
        &self,
        pairs: &[QueryPassagePair<'_>],
        batch_size: usize,
    ) -> Result<Vec<f64>, ScoringError> {
        if batch_size == 0 {
            return Err(ScoringError::InvalidBatchSize);
        }

        let strategy = self.entry.strategy();
        let mut scores = Vec::with_capacity(pairs.len());

        for (batch, chunk) in pairs.chunks(batch_size).enumerate() {
            let started = Instant::now();

            let features = self
                .backend
                .tokenize(self.entry.tokenizer(), chunk)
                .await
                .map_err(|source| ScoringError::Backend { batch, source })?;

            let logits = self
                .backend
                .infer(self.entry.model(), features)
                .await
                .map_err(|source| ScoringError::Backend { batch, source })?;

            self.check_shape(&logits, chunk.len(), batch)?;
            scores.extend(strategy.apply(&logits)?);

            debug!(
                model = %self.entry.key(),
                batch,
                pairs = chunk.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scored batch"
            );
        }

        Ok(scores)
    }

    fn check_shape(
        &self,
        logits: &Logits,
        expected_rows: usize,
        batch: usize,
    ) -> Result<(), ScoringError> {
        let expected_cols = self.entry.info().num_labels;
        let (rows, cols) = logits.shape();

        if rows != expected_rows || cols != expected_cols {
            return Err(ScoringError::ShapeMismatch {
                batch,
                rows,
                cols,
                expected_rows,
                expected_cols,
            });
        }

        Ok(())
    }
}
