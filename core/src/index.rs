use crate::config::SimilarityMetric;
use crate::corpus::{validate_documents, Document, ScoredDocument};
use crate::error::{EngineError, Result};
use crate::sparse::l2_normalize;
use crate::vectorizer::{TfIdfVectorizer, VectorizerConfig};
use serde::{Deserialize, Serialize};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32,     // raw tf-idf weight
    pub normalized: f32, // weight / L2 norm of the document row
}

/// TF-IDF term-weight matrix over a fixed corpus, stored column-major as postings.
///
/// Built once; every query performs an independent vectorize + score pass, so a
/// shared reference can serve concurrent queries without locking.
#[derive(Debug, Default)]
pub struct SimilarityIndex {
    vectorizer: TfIdfVectorizer,
    doc_ids: Vec<String>,
    doc_texts: Vec<String>,
    postings: Vec<Vec<Posting>>, // one list per vocabulary column, sorted by doc_id
}

/// Build an index over `documents` with the default vectorizer settings.
pub fn build_index(documents: &[Document]) -> Result<SimilarityIndex> {
    SimilarityIndex::build(documents, VectorizerConfig::default())
}

impl SimilarityIndex {
    pub fn build(documents: &[Document], config: VectorizerConfig) -> Result<Self> {
        validate_documents(documents)?;
        let doc_ids: Vec<String> = documents.iter().map(|d| d.id().to_string()).collect();
        let doc_texts: Vec<String> = documents.iter().map(|d| d.text().to_string()).collect();

        let mut vectorizer = TfIdfVectorizer::new(config);
        let rows = vectorizer.fit_transform(&doc_texts)?;
        let num_terms = vectorizer.vocabulary().map(|v| v.len()).unwrap_or(0);

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); num_terms];
        for (doc_id, row) in rows.iter().enumerate() {
            let unit = l2_normalize(row);
            for ((term_id, weight), (_, normalized)) in row.iter().zip(unit.iter()) {
                postings[term_id as usize].push(Posting { doc_id: doc_id as DocId, weight, normalized });
            }
        }

        tracing::info!(num_docs = doc_ids.len(), num_terms, "built similarity index");
        Ok(Self { vectorizer, doc_ids, doc_texts, postings })
    }

    pub fn is_built(&self) -> bool { self.vectorizer.is_fitted() }

    pub fn len(&self) -> usize { self.doc_ids.len() }

    pub fn is_empty(&self) -> bool { self.doc_ids.is_empty() }

    /// Number of vocabulary columns; equals the vocabulary size.
    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn vectorizer(&self) -> &TfIdfVectorizer { &self.vectorizer }

    /// One score per document, in corpus order.
    pub fn score(&self, query: &str, metric: SimilarityMetric) -> Result<Vec<f32>> {
        if !self.is_built() {
            return Err(EngineError::NotInitialized("similarity index"));
        }
        let query_vec = self.vectorizer.transform(query)?;
        let mut scores = vec![0.0f32; self.doc_ids.len()];
        match metric {
            SimilarityMetric::Cosine => {
                for (term_id, q_w) in l2_normalize(&query_vec).iter() {
                    for p in &self.postings[term_id as usize] {
                        scores[p.doc_id as usize] += q_w * p.normalized;
                    }
                }
                for s in scores.iter_mut() { *s = s.min(1.0); }
            }
            SimilarityMetric::Dot => {
                for (term_id, q_w) in query_vec.iter() {
                    for p in &self.postings[term_id as usize] {
                        scores[p.doc_id as usize] += q_w * p.weight;
                    }
                }
            }
        }
        Ok(scores)
    }

    /// Top `k` documents by score, descending; equal scores keep corpus order.
    pub fn retrieve(&self, query: &str, k: usize, metric: SimilarityMetric) -> Result<Vec<ScoredDocument>> {
        let scores = self.score(query, metric)?;
        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                document: Document::from_index_parts(&self.doc_ids[i], &self.doc_texts[i]),
                score,
            })
            .collect())
    }
}

/// True when nothing was retrieved or the best score falls below `threshold`.
pub fn is_low_confidence(results: &[ScoredDocument], threshold: f32) -> bool {
    results
        .iter()
        .map(|d| d.score)
        .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
        .map_or(true, |best| best < threshold)
}
