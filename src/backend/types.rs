use std::collections::BTreeMap;

use super::error::BackendError;

/// One (query, passage) input to a cross-encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPassagePair<'a> {
    /// Query text (may be empty).
    pub query: &'a str,
    /// Passage text.
    pub passage: &'a str,
}

impl<'a> QueryPassagePair<'a> {
    /// Creates a pair.
    #[inline]
    pub fn new(query: &'a str, passage: &'a str) -> Self {
        Self { query, passage }
    }
}

/// Raw model output for a batch: a row-major `[rows, cols]` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Logits {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Logits {
    /// Builds a matrix from flat row-major data.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, BackendError> {
        if cols == 0 {
            return Err(BackendError::InvalidOutput {
                reason: "logits must have at least one column".to_string(),
            });
        }

        if data.len() != rows * cols {
            return Err(BackendError::InvalidOutput {
                reason: format!(
                    "expected {} values for shape [{rows}, {cols}], got {}",
                    rows * cols,
                    data.len()
                ),
            });
        }

        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from per-row vectors (all rows must share a width).
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, BackendError> {
        let n = rows.len();
        let cols = rows.first().map(Vec::len).unwrap_or(1);

        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(BackendError::InvalidOutput {
                reason: format!("row {idx} has width {}, expected {cols}", row.len()),
            });
        }

        Self::new(n, cols, rows.into_iter().flatten().collect())
    }

    /// Number of rows (one per scored pair).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (classes per pair).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `[rows, cols]`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns row `idx`, if in range.
    pub fn row(&self, idx: usize) -> Option<&[f32]> {
        if idx >= self.rows {
            return None;
        }
        let start = idx * self.cols;
        Some(&self.data[start..start + self.cols])
    }

    /// Iterates rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.cols)
    }
}

/// Output metadata a model declares about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelInfo {
    /// Declared output width (logit columns per pair).
    pub num_labels: usize,
    /// Optional `index -> label name` map.
    pub id2label: BTreeMap<usize, String>,
}

impl ModelInfo {
    /// A model emitting one relevance logit per pair.
    pub fn single_logit() -> Self {
        Self {
            num_labels: 1,
            id2label: BTreeMap::new(),
        }
    }

    /// A model whose width is given by its labels.
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let id2label: BTreeMap<usize, String> =
            labels.into_iter().map(|(i, s)| (i, s.into())).collect();
        Self {
            num_labels: id2label.len(),
            id2label,
        }
    }

    /// Label name at `idx`, if declared.
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.id2label.get(&idx).map(String::as_str)
    }
}
