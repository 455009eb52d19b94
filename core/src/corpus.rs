use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A corpus snippet. Id and text are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    id: String,
    text: String,
}

#[derive(Deserialize)]
struct RawDocument {
    id: String,
    text: String,
}

impl TryFrom<RawDocument> for Document {
    type Error = EngineError;

    fn try_from(raw: RawDocument) -> Result<Self> {
        Document::new(raw.id, raw.text)
    }
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let (id, text) = (id.into(), text.into());
        if id.is_empty() {
            return Err(EngineError::InvalidCorpus("document id cannot be empty".into()));
        }
        if text.is_empty() {
            return Err(EngineError::InvalidCorpus(format!("document '{id}' has empty text")));
        }
        Ok(Self { id, text })
    }

    /// Rebuilds a document from fields an index already validated.
    pub(crate) fn from_index_parts(id: &str, text: &str) -> Self {
        Self { id: id.to_string(), text: text.to_string() }
    }

    pub fn id(&self) -> &str { &self.id }

    pub fn text(&self) -> &str { &self.text }
}

/// A document paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Rejects empty corpora, blank ids/texts and colliding ids.
pub fn validate_documents(documents: &[Document]) -> Result<()> {
    if documents.is_empty() {
        return Err(EngineError::InvalidCorpus("corpus is empty".into()));
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(documents.len());
    for doc in documents {
        if doc.id.is_empty() || doc.text.is_empty() {
            return Err(EngineError::InvalidCorpus(format!("document '{}' has an empty field", doc.id)));
        }
        if !seen.insert(doc.id.as_str()) {
            return Err(EngineError::InvalidCorpus(format!("duplicate document id '{}'", doc.id)));
        }
    }
    Ok(())
}

const DEFAULT_SNIPPETS: &[(&str, &str)] = &[
    ("s1", "Cosine similarity measures the angle between two vectors, normalizing for magnitude. It's ideal for text comparison where document length shouldn't dominate."),
    ("s2", "Dot product similarity considers both direction and magnitude of vectors. Longer documents with more terms can score higher even if conceptually similar."),
    ("s3", "TF-IDF (Term Frequency-Inverse Document Frequency) weights terms by their importance in a document relative to the entire corpus. Common words get lower weights."),
    ("s4", "Guardrails in AI systems include content filters, rate limits, and policy enforcement. They protect against harmful outputs and resource abuse."),
    ("s5", "FastAPI provides automatic request validation using Pydantic models. Invalid inputs return HTTP 422 with detailed error messages."),
    ("s6", "Latency percentiles (p95, p99) matter more than averages in production systems. Tail latency affects user experience and SLA compliance."),
    ("s7", "The twelve-factor app methodology recommends storing configuration in environment variables, not code. This enables clean separation between environments."),
    ("s8", "Low-confidence detection helps identify when a retrieval system may be returning poor results. It's a simple drift indicator for monitoring."),
    ("s9", "Middleware in FastAPI runs before and after request processing. It's perfect for cross-cutting concerns like logging, metrics, and timing."),
    ("s10", "Top-k retrieval returns the k most similar documents. Higher k increases recall but may reduce precision by including noisier results."),
    ("s11", "Denylist guardrails block specific phrases or patterns. They're deterministic, auditable, and require no ML models—ideal for baseline safety."),
    ("s12", "Vector normalization (L2) scales vectors to unit length. This makes dot product equivalent to cosine similarity and removes magnitude bias."),
];

/// The built-in twelve-snippet corpus, ids `s1`..`s12`.
pub fn default_corpus() -> Vec<Document> {
    DEFAULT_SNIPPETS
        .iter()
        .map(|(id, text)| Document { id: (*id).to_string(), text: (*text).to_string() })
        .collect()
}
