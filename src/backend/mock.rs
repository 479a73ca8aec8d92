use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BackendError, Logits, ModelInfo, QueryPassagePair, ScoringBackend};
use crate::cache::ModelKey;
use crate::constants::DEFAULT_POSITIVE_CLASS_INDEX;

/// Custom logit function: receives `(query, passage)` and returns one row.
pub type LogitFn = Arc<dyn Fn(&str, &str) -> Vec<f32> + Send + Sync>;

/// Deterministic in-process backend.
///
/// Default logits come from query/passage word overlap, so passages sharing
/// more query terms score higher. Counters record every load and inference
/// call for coalescing and batching assertions.
pub struct MockBackend {
    info: ModelInfo,
    positive_index: usize,
    logit_fn: Option<LogitFn>,
    load_delay: Option<Duration>,
    infer_delay: Option<Duration>,
    fail_loads: bool,
    missing_keys: HashSet<String>,
    fail_infer_at: Option<usize>,
    model_loads: AtomicUsize,
    tokenizer_loads: AtomicUsize,
    infer_calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("info", &self.info)
            .field("model_loads", &self.model_loads())
            .field("infer_calls", &self.infer_calls())
            .finish()
    }
}

/// Model handle produced by [`MockBackend`].
#[derive(Debug, Clone)]
pub struct MockModel {
    pub key: ModelKey,
    pub info: ModelInfo,
}

/// Tokenizer handle produced by [`MockBackend`].
#[derive(Debug, Clone)]
pub struct MockTokenizer {
    pub key: ModelKey,
}

impl MockBackend {
    /// Single-logit backend.
    pub fn new() -> Self {
        Self {
            info: ModelInfo::single_logit(),
            positive_index: 0,
            logit_fn: None,
            load_delay: None,
            infer_delay: None,
            fail_loads: false,
            missing_keys: HashSet::new(),
            fail_infer_at: None,
            model_loads: AtomicUsize::new(0),
            tokenizer_loads: AtomicUsize::new(0),
            infer_calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Multi-logit backend declaring `labels`; the relevance signal goes to
    /// `positive_index`.
    pub fn with_labels<S: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = (usize, S)>,
        positive_index: usize,
    ) -> Self {
        self.info = ModelInfo::with_labels(labels);
        self.positive_index = positive_index;
        self
    }

    /// Multi-logit backend without label names.
    pub fn with_width(mut self, width: usize) -> Self {
        self.info = ModelInfo {
            num_labels: width,
            id2label: BTreeMap::new(),
        };
        self.positive_index = if width > 1 {
            DEFAULT_POSITIVE_CLASS_INDEX
        } else {
            0
        };
        self
    }

    /// Replaces the overlap heuristic.
    pub fn with_logit_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Vec<f32> + Send + Sync + 'static,
    {
        self.logit_fn = Some(Arc::new(f));
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    pub fn with_infer_delay(mut self, delay: Duration) -> Self {
        self.infer_delay = Some(delay);
        self
    }

    /// Every model load fails.
    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Loads for `key` fail with [`BackendError::ModelNotFound`].
    pub fn with_missing_key(mut self, key: impl Into<String>) -> Self {
        self.missing_keys.insert(key.into());
        self
    }

    /// The `call`-th inference call (0-based) fails.
    pub fn failing_infer_at(mut self, call: usize) -> Self {
        self.fail_infer_at = Some(call);
        self
    }

    pub fn model_loads(&self) -> usize {
        self.model_loads.load(Ordering::SeqCst)
    }

    pub fn tokenizer_loads(&self) -> usize {
        self.tokenizer_loads.load(Ordering::SeqCst)
    }

    pub fn infer_calls(&self) -> usize {
        self.infer_calls.load(Ordering::SeqCst)
    }

    /// Pair counts of every inference call, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    /// Word-overlap relevance in `[0, 1]`.
    pub fn overlap_score(query: &str, passage: &str) -> f32 {
        let words = |text: &str| -> HashSet<String> {
            text.to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect()
        };

        let query_words = words(query);
        if query_words.is_empty() {
            return 0.0;
        }
        let passage_words = words(passage);
        let matches = query_words.intersection(&passage_words).count();
        matches as f32 / query_words.len() as f32
    }

    fn row_for(&self, pair: &QueryPassagePair<'_>) -> Vec<f32> {
        if let Some(f) = &self.logit_fn {
            return f(pair.query, pair.passage);
        }

        let signal = 8.0 * (Self::overlap_score(pair.query, pair.passage) - 0.5);
        let width = self.info.num_labels.max(1);
        if width == 1 {
            return vec![signal];
        }

        let mut row = vec![-signal; width];
        if let Some(slot) = row.get_mut(self.positive_index) {
            *slot = signal;
        }
        row
    }

    async fn load_gate(&self, key: &ModelKey) -> Result<(), BackendError> {
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }

        if self.missing_keys.contains(key.as_str()) {
            return Err(BackendError::ModelNotFound {
                path: key.as_str().into(),
            });
        }

        if self.fail_loads {
            return Err(BackendError::ModelLoadFailed {
                reason: format!("mock load failure for {key}"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ScoringBackend for MockBackend {
    type Model = MockModel;
    type Tokenizer = MockTokenizer;
    type Features = Vec<(String, String)>;

    async fn load_model(&self, key: &ModelKey) -> Result<Self::Model, BackendError> {
        self.model_loads.fetch_add(1, Ordering::SeqCst);
        self.load_gate(key).await?;
        Ok(MockModel {
            key: key.clone(),
            info: self.info.clone(),
        })
    }

    async fn load_tokenizer(&self, key: &ModelKey) -> Result<Self::Tokenizer, BackendError> {
        self.tokenizer_loads.fetch_add(1, Ordering::SeqCst);
        self.load_gate(key).await?;
        Ok(MockTokenizer { key: key.clone() })
    }

    fn model_info(&self, model: &Self::Model) -> ModelInfo {
        model.info.clone()
    }

    async fn tokenize(
        &self,
        _tokenizer: &Self::Tokenizer,
        pairs: &[QueryPassagePair<'_>],
    ) -> Result<Self::Features, BackendError> {
        Ok(pairs
            .iter()
            .map(|p| (p.query.to_string(), p.passage.to_string()))
            .collect())
    }

    async fn infer(
        &self,
        _model: &Self::Model,
        features: Self::Features,
    ) -> Result<Logits, BackendError> {
        let call = self.infer_calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().push(features.len());

        if let Some(delay) = self.infer_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_infer_at == Some(call) {
            return Err(BackendError::InferenceFailed {
                reason: format!("mock inference failure on call {call}"),
            });
        }

        let rows = features
            .iter()
            .map(|(q, p)| self.row_for(&QueryPassagePair::new(q, p)))
            .collect();
        Logits::from_rows(rows)
    }
}
