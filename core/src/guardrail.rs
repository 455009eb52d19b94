//! Query guardrails: a denylist matcher with a literal substring stage and an
//! optional TF-IDF semantic stage, plus a chain that runs guardrails in order.

use crate::error::{EngineError, Result};
use crate::sparse::{dot, l2_normalize, SparseVector};
use crate::vectorizer::{TfIdfVectorizer, VectorizerConfig, Vocabulary};
use serde::Serialize;

pub const DEFAULT_DENYLIST: &[&str] = &[
    "instructions for illegal activity",
    "how to build a weapon",
    "self-harm methods",
    "violent wrongdoing instructions",
    "bypass safety mechanisms",
    "create malware code",
    "fraud techniques tutorial",
    "illegal drug manufacturing",
    "hack into systems",
    "steal personal information",
];

/// Minimum cosine similarity to a denylist phrase that blocks a query.
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.30;

/// Outcome of running a query through the guardrail chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardrailResult {
    pub blocked: bool,
    pub reason: Option<String>,
}

impl GuardrailResult {
    pub fn allowed() -> Self { Self { blocked: false, reason: None } }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self { blocked: true, reason: Some(reason.into()) }
    }

    pub fn is_safe(&self) -> bool { !self.blocked }
}

/// A single query check. Implementations must be deterministic for a fixed state.
pub trait Guardrail: Send + Sync {
    fn name(&self) -> &str;

    /// What matched, if the query must be blocked.
    fn check(&self, query: &str) -> Option<String>;

    fn reason(&self, matched: &str) -> String {
        format!("Matched denied phrase: '{matched}'")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailConfig {
    pub threshold: f32,
    pub semantic_enabled: bool,
    /// Fit on the denylist phrases only, never on the document corpus.
    pub vectorizer: VectorizerConfig,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SEMANTIC_THRESHOLD,
            semantic_enabled: true,
            vectorizer: VectorizerConfig::default().with_bigrams(),
        }
    }
}

#[derive(Debug)]
pub struct DenylistMatcher {
    phrases: Vec<String>,
    threshold: f32,
    semantic_enabled: bool,
    vectorizer: TfIdfVectorizer,
    phrase_vectors: Vec<SparseVector>, // L2-normalized, parallel to `phrases`
}

/// Build a denylist matcher with the default guardrail vectorizer settings.
pub fn build_guardrail<S: AsRef<str>>(phrases: &[S], threshold: f32, semantic_enabled: bool) -> Result<DenylistMatcher> {
    DenylistMatcher::build(phrases, GuardrailConfig { threshold, semantic_enabled, ..GuardrailConfig::default() })
}

impl DenylistMatcher {
    /// A semantic stage that cannot be fitted leaves the matcher degraded to
    /// substring matching; it is never a build error.
    pub fn build<S: AsRef<str>>(phrases: &[S], config: GuardrailConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "guardrail threshold must be within [0, 1], got {}",
                config.threshold
            )));
        }
        let phrases: Vec<String> = phrases
            .iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let mut vectorizer = TfIdfVectorizer::new(config.vectorizer);
        let mut phrase_vectors = Vec::new();
        if config.semantic_enabled {
            match vectorizer.fit_transform(&phrases) {
                Ok(rows) => {
                    phrase_vectors = rows.iter().map(l2_normalize).collect();
                    let num_terms = vectorizer.vocabulary().map(|v| v.len()).unwrap_or(0);
                    tracing::info!(phrases = phrases.len(), num_terms, "semantic guardrail ready");
                }
                Err(e) => tracing::warn!(error = %e, "semantic guardrail unavailable, using substring matching only"),
            }
        }
        Ok(Self { phrases, threshold: config.threshold, semantic_enabled: config.semantic_enabled, vectorizer, phrase_vectors })
    }

    pub fn phrases(&self) -> &[String] { &self.phrases }

    pub fn threshold(&self) -> f32 { self.threshold }

    /// Vocabulary fitted on the denylist phrases; `None` when the semantic stage is off.
    pub fn vocabulary(&self) -> Option<&Vocabulary> { self.vectorizer.vocabulary() }

    /// True when the semantic stage is enabled and its vectorizer was fitted.
    pub fn is_semantic_ready(&self) -> bool { self.semantic_enabled && self.vectorizer.is_fitted() }

    /// First denylist phrase contained literally in the lowercased query.
    pub fn substring_match(&self, query: &str) -> Option<&str> {
        let lowered = query.to_lowercase();
        self.phrases.iter().find(|p| lowered.contains(p.as_str())).map(String::as_str)
    }

    /// Closest denylist phrase by cosine similarity, if it reaches the threshold.
    pub fn semantic_match(&self, query: &str) -> Option<&str> {
        if !self.is_semantic_ready() {
            return None;
        }
        let query_vec = l2_normalize(&self.vectorizer.transform(query).ok()?);
        if query_vec.is_empty() {
            return None;
        }
        let mut best: Option<(usize, f32)> = None;
        for (i, phrase_vec) in self.phrase_vectors.iter().enumerate() {
            let score = dot(&query_vec, phrase_vec);
            tracing::debug!(phrase = %self.phrases[i], score, "semantic guardrail score");
            // strict comparison keeps the earliest phrase on ties
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((i, score));
            }
        }
        let (i, score) = best?;
        if score >= self.threshold {
            tracing::info!(matched = %self.phrases[i], score, "semantic guardrail triggered");
            Some(self.phrases[i].as_str())
        } else {
            None
        }
    }
}

impl Guardrail for DenylistMatcher {
    fn name(&self) -> &str { "denylist" }

    fn check(&self, query: &str) -> Option<String> {
        if query.trim().is_empty() {
            return None;
        }
        if let Some(phrase) = self.substring_match(query) {
            tracing::info!(matched = %phrase, "substring guardrail triggered");
            return Some(phrase.to_string());
        }
        self.semantic_match(query).map(str::to_string)
    }
}

/// Runs guardrails in insertion order and stops at the first block.
#[derive(Default)]
pub struct GuardrailChain {
    guardrails: Vec<Box<dyn Guardrail>>,
}

impl GuardrailChain {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, guardrail: impl Guardrail + 'static) -> Self {
        self.push(guardrail);
        self
    }

    pub fn push(&mut self, guardrail: impl Guardrail + 'static) {
        self.guardrails.push(Box::new(guardrail));
    }

    pub fn len(&self) -> usize { self.guardrails.len() }

    pub fn is_empty(&self) -> bool { self.guardrails.is_empty() }

    pub fn check_query(&self, query: &str) -> GuardrailResult {
        for guardrail in &self.guardrails {
            if let Some(matched) = guardrail.check(query) {
                tracing::info!(guardrail = guardrail.name(), %matched, "query blocked");
                return GuardrailResult::blocked(guardrail.reason(&matched));
            }
        }
        GuardrailResult::allowed()
    }
}
