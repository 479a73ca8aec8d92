use std::collections::BTreeMap;

use super::error::ScoringError;
use crate::backend::{Logits, ModelInfo};
use crate::constants::DEFAULT_POSITIVE_CLASS_INDEX;

const POSITIVE_MARKERS: [&str; 2] = ["relevant", "positive"];
/// Whole-token negations ("not_relevant", "non-relevant").
const NEGATION_TOKENS: [&str; 4] = ["not", "non", "no", "negative"];
/// Prefixes that negate a marker inside one token ("irrelevant", "nonpositive").
const NEGATION_PREFIXES: [&str; 4] = ["ir", "non", "not", "un"];

/// How raw logits become a relevance probability in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationStrategy {
    /// One logit per pair, mapped through the logistic function.
    SingleLogitSigmoid,
    /// Softmax across the row, keeping the probability at `class_index`.
    MultiLogitSoftmax { class_index: usize },
}

impl NormalizationStrategy {
    /// Chooses a strategy from the model's declared width and labels.
    pub fn resolve(info: &ModelInfo) -> Result<Self, ScoringError> {
        match info.num_labels {
            0 => Err(ScoringError::InvalidModelOutput {
                reason: "model declares zero output labels".to_string(),
            }),
            1 => Ok(Self::SingleLogitSigmoid),
            width => {
                let class_index =
                    positive_class_index(&info.id2label).unwrap_or(DEFAULT_POSITIVE_CLASS_INDEX);
                if class_index >= width {
                    return Err(ScoringError::InvalidModelOutput {
                        reason: format!(
                            "positive label index {class_index} is outside {width} outputs"
                        ),
                    });
                }
                Ok(Self::MultiLogitSoftmax { class_index })
            }
        }
    }

    /// Normalizes every row of `logits`, preserving row order.
    pub fn apply(&self, logits: &Logits) -> Result<Vec<f64>, ScoringError> {
        let scores: Vec<f64> = match *self {
            Self::SingleLogitSigmoid => {
                if logits.cols() != 1 {
                    return Err(ScoringError::InvalidModelOutput {
                        reason: format!("sigmoid expects 1 column, got {}", logits.cols()),
                    });
                }
                logits
                    .iter_rows()
                    .map(|row| sigmoid(f64::from(row[0])))
                    .collect()
            }
            Self::MultiLogitSoftmax { class_index } => {
                if logits.cols() <= class_index {
                    return Err(ScoringError::InvalidModelOutput {
                        reason: format!(
                            "softmax class {class_index} is outside {} columns",
                            logits.cols()
                        ),
                    });
                }
                logits
                    .iter_rows()
                    .map(|row| {
                        let row: Vec<f64> = row.iter().map(|&v| f64::from(v)).collect();
                        softmax(&row)[class_index]
                    })
                    .collect()
            }
        };

        if let Some(idx) = scores.iter().position(|s| !s.is_finite()) {
            return Err(ScoringError::InvalidModelOutput {
                reason: format!("non-finite score for row {idx}"),
            });
        }

        Ok(scores)
    }
}

impl std::fmt::Display for NormalizationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleLogitSigmoid => write!(f, "SINGLE_LOGIT_SIGMOID"),
            Self::MultiLogitSoftmax { class_index } => {
                write!(f, "MULTI_LOGIT_SOFTMAX({class_index})")
            }
        }
    }
}

/// Logistic function `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Max-shifted softmax.
pub fn softmax(row: &[f64]) -> Vec<f64> {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|&v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// First label (by index) naming the relevant/positive class.
///
/// Labels are split into lowercase alphanumeric tokens. A label matches when
/// a token contains a positive marker and no token negates it, either as a
/// whole word ("not", "non") or as a prefix glued to the marker ("irrelevant").
pub fn positive_class_index(id2label: &BTreeMap<usize, String>) -> Option<usize> {
    id2label
        .iter()
        .find_map(|(&idx, label)| is_positive_label(label).then_some(idx))
}

fn is_positive_label(label: &str) -> bool {
    let label = label.to_lowercase();
    let tokens: Vec<&str> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let positive = tokens
        .iter()
        .any(|t| POSITIVE_MARKERS.iter().any(|m| t.contains(m)));
    let negated = tokens.iter().any(|t| {
        NEGATION_TOKENS.contains(t)
            || POSITIVE_MARKERS.iter().any(|m| {
                NEGATION_PREFIXES
                    .iter()
                    .any(|p| t.strip_prefix(p).is_some_and(|rest| rest.starts_with(m)))
            })
    });

    positive && !negated
}
