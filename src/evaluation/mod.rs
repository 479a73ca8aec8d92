//! Ranking-quality evaluation (MRR, NDCG, Precision and Recall at K).
//!
//! The metric functions are pure. [`Evaluator`] drives a
//! [`Reranker`](crate::reranker::Reranker) over a judged dataset and averages
//! the per-query results.

pub mod error;
pub mod harness;
pub mod metrics;
pub mod types;


pub use error::EvaluationError;
pub use harness::{EvalQuery, EvaluationReport, Evaluator, JudgedDocument, load_dataset};
pub use metrics::{
    calculate_all_metrics, calculate_average_metrics, dcg_at_k, idcg_at_k, metric_at_k,
    mrr_at_k, ndcg_at_k, precision_at_k, recall_at_k,
};
pub use types::{
    AverageMetrics, AverageOutcome, Judged, Metric, MetricSet, QueryEvaluation, RankedPassage,
};

/// Scores a ranked list at each cutoff, keyed `"<METRIC>@<k>"`.
pub fn evaluate<T: Judged>(ranked: &[T], k_values: &[usize]) -> MetricSet {
    calculate_all_metrics(ranked, k_values)
}
