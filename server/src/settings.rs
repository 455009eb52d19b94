use clap::{ArgAction, Parser};
use ragcore::guardrail::DEFAULT_SEMANTIC_THRESHOLD;
use ragcore::vectorizer::DEFAULT_MAX_FEATURES;
use ragcore::{RetrievalConfig, SimilarityMetric};
use std::path::PathBuf;

pub const DEFAULT_LOW_CONF_THRESHOLD: f32 = 0.15;
pub const DEFAULT_MAX_LATENCY_SAMPLES: usize = 1000;

/// Service settings. Every flag falls back to an environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "ragserver")]
#[command(about = "Retrieval-augmented answering over a small in-memory corpus", long_about = None)]
pub struct Settings {
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
    /// JSON array of {"id", "text"} objects; the built-in corpus when omitted
    #[arg(long, env = "CORPUS_PATH")]
    pub corpus: Option<PathBuf>,
    /// Similarity metric used when a request names no preset
    #[arg(long, env = "CONFIG_DEFAULT", default_value_t = SimilarityMetric::Cosine)]
    pub config_default: SimilarityMetric,
    /// Result count used when a request names no preset
    #[arg(long, env = "TOP_K_DEFAULT", default_value_t = 3)]
    pub top_k_default: usize,
    /// Best score below this marks a retrieval as low confidence
    #[arg(long, env = "LOW_CONF_THRESHOLD", default_value_t = DEFAULT_LOW_CONF_THRESHOLD)]
    pub low_conf_threshold: f32,
    /// Cosine similarity to a denylist phrase that blocks a query
    #[arg(long, env = "GUARDRAIL_THRESHOLD", default_value_t = DEFAULT_SEMANTIC_THRESHOLD)]
    pub guardrail_threshold: f32,
    /// Enable the semantic guardrail stage
    #[arg(long, env = "SEMANTIC_GUARDRAIL", default_value_t = true, action = ArgAction::Set)]
    pub semantic_guardrail: bool,
    /// Vocabulary cap for both the index and the guardrail vectorizers
    #[arg(long, env = "MAX_FEATURES", default_value_t = DEFAULT_MAX_FEATURES)]
    pub max_features: usize,
    /// Latency samples kept for the metrics report
    #[arg(long, env = "MAX_LATENCY_SAMPLES", default_value_t = DEFAULT_MAX_LATENCY_SAMPLES)]
    pub max_latency_samples: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            corpus: None,
            config_default: SimilarityMetric::Cosine,
            top_k_default: 3,
            low_conf_threshold: DEFAULT_LOW_CONF_THRESHOLD,
            guardrail_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            semantic_guardrail: true,
            max_features: DEFAULT_MAX_FEATURES,
            max_latency_samples: DEFAULT_MAX_LATENCY_SAMPLES,
        }
    }
}

impl Settings {
    /// Retrieval config applied when a request carries no preset.
    pub fn default_retrieval(&self) -> ragcore::Result<RetrievalConfig> {
        RetrievalConfig::new(self.config_default, self.top_k_default)
    }
}
