pub mod config;
pub mod corpus;
pub mod error;
pub mod guardrail;
pub mod index;
pub mod scoring;
pub mod sparse;
pub mod tokenizer;
pub mod vectorizer;

pub use config::{Preset, RetrievalConfig, SimilarityMetric};
pub use corpus::{default_corpus, Document, ScoredDocument};
pub use error::{EngineError, Result};
pub use guardrail::{build_guardrail, DenylistMatcher, Guardrail, GuardrailChain, GuardrailConfig, GuardrailResult};
pub use index::{build_index, is_low_confidence, DocId, Posting, SimilarityIndex, TermId};
pub use sparse::SparseVector;
pub use vectorizer::{TfIdfVectorizer, VectorizerConfig, Vocabulary};
