//! TF-IDF vectorizer with a capped vocabulary.
//!
//! Weights use raw term counts and the smoothed inverse document frequency
//! `idf(t) = ln((1 + N) / (1 + df(t))) + 1`, where `N` is the number of reference
//! texts the vocabulary was fit on. Output vectors are not normalized.

use crate::error::{EngineError, Result};
use crate::sparse::SparseVector;
use crate::tokenizer::{tokenize_with, TokenizerOptions};
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_FEATURES: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Upper bound on vocabulary size.
    pub max_features: usize,
    /// Inclusive (min, max) n-gram lengths over the filtered token stream.
    pub ngram_range: (usize, usize),
    pub tokenizer: TokenizerOptions,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            ngram_range: (1, 1),
            tokenizer: TokenizerOptions::default(),
        }
    }
}

impl VectorizerConfig {
    /// Unigrams plus adjacent-pair bigrams.
    pub fn with_bigrams(mut self) -> Self {
        self.ngram_range = (1, 2);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(EngineError::InvalidConfig("max_features must be at least 1".into()));
        }
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(EngineError::InvalidConfig(format!("invalid ngram_range ({lo}, {hi})")));
        }
        Ok(())
    }
}

/// Term → column mapping plus the IDF weights of the reference corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    dictionary: HashMap<String, TermId>,
    idf: Vec<f32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.idf.len() }

    pub fn is_empty(&self) -> bool { self.idf.is_empty() }

    pub fn get(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn contains(&self, term: &str) -> bool { self.dictionary.contains_key(term) }

    pub fn idf(&self, column: TermId) -> f32 { self.idf[column as usize] }
}

#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
    vocabulary: Option<Vocabulary>,
}

impl TfIdfVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        Self { config, vocabulary: None }
    }

    pub fn config(&self) -> &VectorizerConfig { &self.config }

    pub fn is_fitted(&self) -> bool { self.vocabulary.is_some() }

    pub fn vocabulary(&self) -> Option<&Vocabulary> { self.vocabulary.as_ref() }

    /// Split text into vocabulary candidates: filtered tokens, then n-grams joined by a space.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = tokenize_with(text, &self.config.tokenizer)
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        let (lo, hi) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in lo..=hi {
            if n == 1 {
                terms.extend(tokens.iter().cloned());
            } else {
                terms.extend(tokens.windows(n).map(|w| w.join(" ")));
            }
        }
        terms
    }

    /// Learn the vocabulary and IDF statistics. Allowed once per instance.
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<()> {
        if self.vocabulary.is_some() {
            return Err(EngineError::AlreadyFitted);
        }
        self.config.validate()?;

        let mut total: HashMap<String, u32> = HashMap::new();
        let mut df: HashMap<String, u32> = HashMap::new();
        for text in texts {
            let terms = self.analyze(text.as_ref());
            let mut seen_in_doc: HashSet<&str> = HashSet::new();
            for term in &terms {
                *total.entry(term.clone()).or_insert(0) += 1;
                if seen_in_doc.insert(term.as_str()) {
                    *df.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }
        if total.is_empty() {
            return Err(EngineError::EmptyVocabulary);
        }

        // Most frequent first, ties by term; then columns in term order.
        let mut ranked: Vec<(String, u32)> = total.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_features);
        let mut kept: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        kept.sort();

        let n = texts.len() as f32;
        let mut dictionary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (column, term) in kept.into_iter().enumerate() {
            let df_t = df.get(&term).copied().unwrap_or(0);
            idf.push(((1.0 + n) / (1.0 + df_t as f32)).ln() + 1.0);
            dictionary.insert(term, column as TermId);
        }
        tracing::debug!(num_docs = texts.len(), num_terms = idf.len(), "fitted vocabulary");
        self.vocabulary = Some(Vocabulary { dictionary, idf });
        Ok(())
    }

    /// Raw TF-IDF vector for `text`; terms outside the vocabulary are dropped.
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        let vocab = self.vocabulary.as_ref().ok_or(EngineError::NotInitialized("vectorizer"))?;
        Ok(self
            .analyze(text)
            .iter()
            .filter_map(|term| vocab.get(term))
            .map(|column| (column, vocab.idf(column)))
            .collect())
    }

    pub fn transform_many<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<SparseVector>> {
        texts.iter().map(|t| self.transform(t.as_ref())).collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(texts)?;
        self.transform_many(texts)
    }
}
