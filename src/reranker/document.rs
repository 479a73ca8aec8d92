use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field holding the passage text in a record document.
pub const TEXT_FIELD: &str = "text";

/// Keys the reranker writes on every [`ScoredDocument`].
pub const CORPUS_ID_FIELD: &str = "corpus_id";
pub const SCORE_FIELD: &str = "score";

/// A document to rerank: raw text, or a record with a `text` field plus any
/// caller fields (carried through unchanged).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Text(String),
    Record(Map<String, Value>),
}

impl Document {
    /// Builds a record from text and extra fields.
    pub fn record<I, K>(text: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut map: Map<String, Value> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        map.insert(TEXT_FIELD.to_string(), Value::String(text.into()));
        Document::Record(map)
    }

    /// Passage text, or `None` when a record has no string `text` field.
    pub fn text(&self) -> Option<&str> {
        match self {
            Document::Text(text) => Some(text),
            Document::Record(map) => map.get(TEXT_FIELD).and_then(Value::as_str),
        }
    }

    /// All fields of the document; plain text becomes `{ "text": ... }`.
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Document::Text(text) => {
                let mut map = Map::new();
                map.insert(TEXT_FIELD.to_string(), Value::String(text));
                map
            }
            Document::Record(map) => map,
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document::Text(text.to_string())
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Document::Text(text)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Document::Record(map)
    }
}

/// One reranked document.
///
/// Serializes as a flat object: `corpus_id`, `score`, then every caller field
/// (caller fields named `corpus_id` or `score` are kept in [`fields`](Self::fields)
/// but not serialized).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    /// Position of the document in the caller's input.
    pub corpus_id: usize,
    /// Normalized relevance, higher is more relevant.
    pub score: f64,
    /// Original document fields.
    pub fields: Map<String, Value>,
}

impl ScoredDocument {
    pub fn new(corpus_id: usize, score: f64, document: Document) -> Self {
        Self {
            corpus_id,
            score,
            fields: document.into_fields(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.fields.get(TEXT_FIELD).and_then(Value::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Serialize for ScoredDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(CORPUS_ID_FIELD, &self.corpus_id)?;
        map.serialize_entry(SCORE_FIELD, &self.score)?;
        for (key, value) in &self.fields {
            if key != CORPUS_ID_FIELD && key != SCORE_FIELD {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}
