use thiserror::Error;

/// Errors raised by the retrieval engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A component was used before its build step ran.
    #[error("{0} not initialized")]
    NotInitialized(&'static str),
    /// Retrieval or guardrail settings outside their allowed range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Empty id/text or duplicate ids while building an index.
    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),
    #[error("vectorizer already fitted")]
    AlreadyFitted,
    #[error("empty vocabulary: reference texts contain no indexable terms")]
    EmptyVocabulary,
}

impl EngineError {
    /// True for errors caused by caller input rather than startup ordering or corpus state.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
