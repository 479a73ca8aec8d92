use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::EvaluationError;

/// Anything carrying a relevance judgement.
pub trait Judged {
    fn is_relevant(&self) -> bool;
}

impl Judged for bool {
    #[inline]
    fn is_relevant(&self) -> bool {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Mrr,
    Ndcg,
    Precision,
    Recall,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Mrr, Metric::Ndcg, Metric::Precision, Metric::Recall];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mrr => "MRR",
            Metric::Ndcg => "NDCG",
            Metric::Precision => "Precision",
            Metric::Recall => "Recall",
        }
    }

    /// Report key, e.g. `NDCG@10`.
    pub fn key(&self, k: usize) -> String {
        format!("{}@{k}", self.name())
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Metric values keyed by `"<METRIC>@<k>"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<String, f64>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric, k: usize, value: f64) {
        self.0.insert(metric.key(k), value);
    }

    pub fn get(&self, metric: Metric, k: usize) -> Option<f64> {
        self.0.get(&metric.key(k)).copied()
    }

    /// Looks up a raw key such as `"MRR@3"`.
    pub fn get_key(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// One entry of a ranked list under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    pub corpus_id: usize,
    pub score: f64,
    pub is_relevant: bool,
}

impl Judged for RankedPassage {
    #[inline]
    fn is_relevant(&self) -> bool {
        self.is_relevant
    }
}

/// Per-query evaluation: the ranked list and its metrics, or the failure
/// that prevented ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub ranked: Vec<RankedPassage>,
    pub metrics: MetricSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryEvaluation {
    /// Evaluates `ranked` at every cutoff in `k_values`.
    pub fn new(query: impl Into<String>, ranked: Vec<RankedPassage>, k_values: &[usize]) -> Self {
        let metrics = super::metrics::calculate_all_metrics(&ranked, k_values);
        Self {
            query: query.into(),
            ranked,
            metrics,
            error: None,
        }
    }

    /// A query whose ranking failed; excluded from averages.
    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ranked: Vec::new(),
            metrics: MetricSet::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageOutcome {
    /// Mean of each metric across valid queries.
    Averages(MetricSet),
    /// Every query errored (or there were none).
    NoValidResults,
}

/// Aggregate over a set of [`QueryEvaluation`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub total_queries: usize,
    pub valid_queries: usize,
    pub error_queries: usize,
    pub outcome: AverageOutcome,
}

impl AverageMetrics {
    pub fn averages(&self) -> Option<&MetricSet> {
        match &self.outcome {
            AverageOutcome::Averages(metrics) => Some(metrics),
            AverageOutcome::NoValidResults => None,
        }
    }

    pub fn has_valid_results(&self) -> bool {
        matches!(self.outcome, AverageOutcome::Averages(_))
    }

    /// The averages, or [`EvaluationError::NoValidResults`].
    pub fn into_metrics(self) -> Result<MetricSet, EvaluationError> {
        match self.outcome {
            AverageOutcome::Averages(metrics) => Ok(metrics),
            AverageOutcome::NoValidResults => Err(EvaluationError::NoValidResults {
                total_queries: self.total_queries,
                error_queries: self.error_queries,
            }),
        }
    }
}
