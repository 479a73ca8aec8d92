//! Shared integration-test fixtures.

use crossrank::evaluation::{EvalQuery, JudgedDocument};
use crossrank::{Document, MockBackend, ModelCacheHandle, Reranker, RerankerConfig};

pub const MODEL: &str = "cross-encoder/mock-minilm";

/// A small judged corpus: `(query, [(passage, is_relevant)])`.
pub const QUERIES: [(&str, &[(&str, bool)]); 3] = [
    (
        "how does tokio schedule tasks",
        &[
            ("tokio uses a work stealing scheduler for tasks", true),
            ("the python asyncio event loop", false),
            ("tokio tasks are scheduled cooperatively", true),
            ("baking sourdough bread", false),
        ],
    ),
    (
        "rust borrow checker rules",
        &[
            ("garbage collection in java", false),
            ("the borrow checker enforces rust aliasing rules", true),
            ("rust has a package manager named cargo", false),
        ],
    ),
    (
        "vector database",
        &[
            ("relational databases and sql", false),
            ("storing embeddings in a vector database", true),
        ],
    ),
];

pub fn dataset() -> Vec<EvalQuery> {
    QUERIES
        .iter()
        .map(|(query, passages)| EvalQuery {
            query: query.to_string(),
            passages: passages
                .iter()
                .map(|(text, relevant)| JudgedDocument::new(*text, *relevant))
                .collect(),
        })
        .collect()
}

pub fn documents(query_idx: usize) -> Vec<Document> {
    QUERIES[query_idx]
        .1
        .iter()
        .map(|(text, _)| Document::from(*text))
        .collect()
}

pub struct RerankerBuilder {
    backend: MockBackend,
    config: RerankerConfig,
}

impl Default for RerankerBuilder {
    fn default() -> Self {
        Self {
            backend: MockBackend::new(),
            config: RerankerConfig::new(MODEL),
        }
    }
}

impl RerankerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: MockBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config = self.config.with_top_k(top_k);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config = self.config.with_batch_size(batch_size);
        self
    }

    pub fn build(self) -> Reranker<MockBackend> {
        Reranker::new(ModelCacheHandle::new(self.backend), self.config)
            .expect("fixture config should be valid")
    }

    pub async fn initialized(self) -> Reranker<MockBackend> {
        let reranker = self.build();
        reranker
            .initialize()
            .await
            .expect("mock model should load");
        reranker
    }
}
