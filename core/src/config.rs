use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Normalized, length-invariant.
    #[default]
    Cosine,
    /// Raw weights, magnitude-sensitive.
    Dot,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Dot => "dot",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "dot" => Ok(SimilarityMetric::Dot),
            other => Err(EngineError::InvalidConfig(format!("unknown similarity metric '{other}'"))),
        }
    }
}

/// Named retrieval settings accepted by the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// cosine, k=3
    Cos3,
    /// dot, k=5
    Dot5,
}

impl Preset {
    pub fn config(self) -> RetrievalConfig {
        match self {
            Preset::Cos3 => RetrievalConfig { similarity_metric: SimilarityMetric::Cosine, top_k: 3 },
            Preset::Dot5 => RetrievalConfig { similarity_metric: SimilarityMetric::Dot, top_k: 5 },
        }
    }
}

impl FromStr for Preset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cos3" => Ok(Preset::Cos3),
            "dot5" => Ok(Preset::Dot5),
            other => Err(EngineError::InvalidConfig(format!("unknown preset '{other}'"))),
        }
    }
}

/// Metric and result count for one retrieval. Only constructible within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetrievalConfig {
    similarity_metric: SimilarityMetric,
    top_k: usize,
}

impl RetrievalConfig {
    pub fn new(similarity_metric: SimilarityMetric, top_k: usize) -> Result<Self> {
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
            return Err(EngineError::InvalidConfig(format!(
                "top_k must be between {MIN_TOP_K} and {MAX_TOP_K}, got {top_k}"
            )));
        }
        Ok(Self { similarity_metric, top_k })
    }

    pub fn from_preset(preset: Preset) -> Self { preset.config() }

    /// Same metric, different k.
    pub fn with_top_k(self, top_k: usize) -> Result<Self> {
        Self::new(self.similarity_metric, top_k)
    }

    pub fn similarity_metric(&self) -> SimilarityMetric { self.similarity_metric }

    pub fn top_k(&self) -> usize { self.top_k }

    /// Label such as `cosine,k=3`.
    pub fn description(&self) -> String {
        format!("{},k={}", self.similarity_metric, self.top_k)
    }
}

impl fmt::Display for RetrievalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
