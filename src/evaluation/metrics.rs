//! Ranking-quality metrics over a relevance-flagged ranked list.
//!
//! Every function takes the ranked sequence best-first. Ranks are 1-indexed.
//! `total_relevant` is the number of relevant entries in the sequence given.

use super::types::{AverageMetrics, AverageOutcome, Judged, Metric, MetricSet, QueryEvaluation};

/// Reciprocal rank of the first relevant item within the first `k`; 0 if none.
pub fn mrr_at_k(relevance: &[bool], k: usize) -> f64 {
    relevance
        .iter()
        .take(k)
        .position(|&relevant| relevant)
        .map_or(0.0, |idx| 1.0 / (idx + 1) as f64)
}

/// Rank 1 counts in full; later ranks are discounted by `log2(rank)`.
#[inline]
fn discount(rank: usize) -> f64 {
    if rank <= 1 {
        1.0
    } else {
        1.0 / (rank as f64).log2()
    }
}

pub fn dcg_at_k(relevance: &[bool], k: usize) -> f64 {
    relevance
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, relevant)| **relevant)
        .map(|(idx, _)| discount(idx + 1))
        .sum()
}

/// DCG of the ideal ordering: every relevant item first.
pub fn idcg_at_k(relevance: &[bool], k: usize) -> f64 {
    let ideal = total_relevant(relevance).min(k);
    (1..=ideal).map(discount).sum()
}

/// `DCG@k / IDCG@k`, or 0 when nothing is relevant.
pub fn ndcg_at_k(relevance: &[bool], k: usize) -> f64 {
    let idcg = idcg_at_k(relevance, k);
    if idcg == 0.0 {
        return 0.0;
    }
    dcg_at_k(relevance, k) / idcg
}

pub fn precision_at_k(relevance: &[bool], k: usize) -> f64 {
    let cutoff = k.min(relevance.len());
    if cutoff == 0 {
        return 0.0;
    }
    relevant_in_top(relevance, cutoff) as f64 / cutoff as f64
}

pub fn recall_at_k(relevance: &[bool], k: usize) -> f64 {
    let total = total_relevant(relevance);
    if total == 0 {
        return 0.0;
    }
    relevant_in_top(relevance, k) as f64 / total as f64
}

/// Computes one metric at cutoff `k`.
pub fn metric_at_k(metric: Metric, relevance: &[bool], k: usize) -> f64 {
    match metric {
        Metric::Mrr => mrr_at_k(relevance, k),
        Metric::Ndcg => ndcg_at_k(relevance, k),
        Metric::Precision => precision_at_k(relevance, k),
        Metric::Recall => recall_at_k(relevance, k),
    }
}

/// Every [`Metric`] at every cutoff in `k_values`.
pub fn calculate_all_metrics<T: Judged>(ranked: &[T], k_values: &[usize]) -> MetricSet {
    let relevance: Vec<bool> = ranked.iter().map(Judged::is_relevant).collect();

    let mut metrics = MetricSet::new();
    for &k in k_values {
        for metric in Metric::ALL {
            metrics.insert(metric, k, metric_at_k(metric, &relevance, k));
        }
    }
    metrics
}

/// Mean of every metric across the queries that did not error.
///
/// A query missing a stored value for some cutoff is scored from its ranked
/// list. With no valid query the outcome is [`AverageOutcome::NoValidResults`].
pub fn calculate_average_metrics(
    results: &[QueryEvaluation],
    k_values: &[usize],
) -> AverageMetrics {
    let valid: Vec<&QueryEvaluation> = results.iter().filter(|r| !r.is_error()).collect();
    let total_queries = results.len();
    let valid_queries = valid.len();

    let outcome = if valid.is_empty() {
        AverageOutcome::NoValidResults
    } else {
        let mut averages = MetricSet::new();
        for &k in k_values {
            for metric in Metric::ALL {
                let sum: f64 = valid
                    .iter()
                    .map(|r| {
                        r.metrics.get(metric, k).unwrap_or_else(|| {
                            let relevance: Vec<bool> =
                                r.ranked.iter().map(Judged::is_relevant).collect();
                            metric_at_k(metric, &relevance, k)
                        })
                    })
                    .sum();
                averages.insert(metric, k, sum / valid_queries as f64);
            }
        }
        AverageOutcome::Averages(averages)
    };

    AverageMetrics {
        total_queries,
        valid_queries,
        error_queries: total_queries - valid_queries,
        outcome,
    }
}

fn total_relevant(relevance: &[bool]) -> usize {
    relevance.iter().filter(|&&relevant| relevant).count()
}

fn relevant_in_top(relevance: &[bool], k: usize) -> usize {
    relevance.iter().take(k).filter(|&&relevant| relevant).count()
}
