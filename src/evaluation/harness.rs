use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::EvaluationError;
use super::metrics::calculate_average_metrics;
use super::types::{AverageMetrics, QueryEvaluation, RankedPassage};
use crate::backend::ScoringBackend;
use crate::reranker::{Document, RerankOptions, Reranker};

/// A candidate passage with its ground-truth judgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedDocument {
    pub document: Document,
    #[serde(default)]
    pub is_relevant: bool,
}

impl JudgedDocument {
    pub fn new(document: impl Into<Document>, is_relevant: bool) -> Self {
        Self {
            document: document.into(),
            is_relevant,
        }
    }
}

/// One evaluation query and its candidate passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalQuery {
    pub query: String,
    pub passages: Vec<JudgedDocument>,
}

/// Per-query results and their average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub k_values: Vec<usize>,
    pub queries: Vec<QueryEvaluation>,
    pub averages: AverageMetrics,
}

/// Reads a JSON array of [`EvalQuery`] from `path`.
pub async fn load_dataset(path: &Path) -> Result<Vec<EvalQuery>, EvaluationError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| EvaluationError::DatasetRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    serde_json::from_str(&content).map_err(|e| EvaluationError::DatasetParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Ranks every passage of every query with a [`Reranker`] and scores the
/// rankings against the judgements.
pub struct Evaluator<'a, B: ScoringBackend> {
    reranker: &'a Reranker<B>,
    k_values: Vec<usize>,
}

impl<'a, B: ScoringBackend> Evaluator<'a, B> {
    pub fn new(reranker: &'a Reranker<B>, k_values: impl Into<Vec<usize>>) -> Self {
        Self {
            reranker,
            k_values: k_values.into(),
        }
    }

    pub fn k_values(&self) -> &[usize] {
        &self.k_values
    }

    /// Evaluates one query; a rerank failure becomes an errored evaluation.
    pub async fn evaluate_query(&self, query: &EvalQuery) -> QueryEvaluation {
        let judgements: Vec<bool> = query.passages.iter().map(|p| p.is_relevant).collect();
        let documents: Vec<Document> = query.passages.iter().map(|p| p.document.clone()).collect();

        let options = RerankOptions {
            top_k: documents.len(),
            ..self.reranker.config().options
        };

        match self
            .reranker
            .rerank_with(&query.query, documents, options)
            .await
        {
            Ok(scored) => {
                let ranked = scored
                    .into_iter()
                    .map(|doc| RankedPassage {
                        corpus_id: doc.corpus_id,
                        score: doc.score,
                        is_relevant: judgements[doc.corpus_id],
                    })
                    .collect();
                QueryEvaluation::new(query.query.clone(), ranked, &self.k_values)
            }
            Err(e) => {
                warn!(query = %query.query, error = %e, "Query evaluation failed");
                QueryEvaluation::failed(query.query.clone(), e.to_string())
            }
        }
    }

    /// Evaluates every query in order and averages the valid ones.
    pub async fn run(&self, dataset: &[EvalQuery]) -> EvaluationReport {
        let started = Instant::now();

        let mut queries = Vec::with_capacity(dataset.len());
        for query in dataset {
            queries.push(self.evaluate_query(query).await);
        }

        let averages = calculate_average_metrics(&queries, &self.k_values);

        info!(
            total = averages.total_queries,
            valid = averages.valid_queries,
            errors = averages.error_queries,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Evaluation complete"
        );

        EvaluationReport {
            k_values: self.k_values.clone(),
            queries,
            averages,
        }
    }
}
