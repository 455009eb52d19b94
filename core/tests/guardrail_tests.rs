use ragcore::guardrail::{DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD};
use ragcore::{build_guardrail, build_index, default_corpus, Guardrail, GuardrailChain, GuardrailResult};

#[test]
fn substring_stage_alone_blocks_and_allows() {
    for semantic in [true, false] {
        let m = build_guardrail(DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD, semantic).unwrap();
        assert_eq!(m.check("how to build a weapon").as_deref(), Some("how to build a weapon"));
        assert_eq!(m.check("What is cosine similarity?"), None);
    }
}

#[test]
fn substring_match_ignores_case() {
    let m = build_guardrail(DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD, false).unwrap();
    assert_eq!(m.check("Please give INSTRUCTIONS FOR ILLEGAL ACTIVITY now").as_deref(), Some("instructions for illegal activity"));
}

#[test]
fn semantic_stage_catches_reordered_wording() {
    let m = build_guardrail(DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD, true).unwrap();
    assert!(m.is_semantic_ready());
    assert_eq!(m.substring_match("weapon build guide please"), None);
    assert_eq!(m.check("weapon build guide please").as_deref(), Some("how to build a weapon"));
    assert_eq!(m.check("how do I hack systems").as_deref(), Some("hack into systems"));
    // "system" is not "systems"
    assert_eq!(m.check("How to improve system security?"), None);
}

#[test]
fn semantic_stage_respects_threshold() {
    let strict = build_guardrail(DEFAULT_DENYLIST, 0.9, true).unwrap();
    assert_eq!(strict.check("weapon build guide please"), None);
}

#[test]
fn blank_queries_are_never_blocked() {
    let m = build_guardrail(DEFAULT_DENYLIST, 0.0, true).unwrap();
    assert_eq!(m.check(""), None);
    assert_eq!(m.check("   \t"), None);
}

#[test]
fn checks_are_deterministic() {
    let m = build_guardrail(DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD, true).unwrap();
    for q in ["steal information", "What is cosine similarity?", "malware"] {
        assert_eq!(m.check(q), m.check(q));
    }
}

#[test]
fn unfittable_semantic_stage_degrades_to_substring() {
    // every phrase is stopwords only, so the guardrail vectorizer cannot be fitted
    let m = build_guardrail(&["how to", "what is"], DEFAULT_SEMANTIC_THRESHOLD, true).unwrap();
    assert!(!m.is_semantic_ready());
    assert_eq!(m.semantic_match("anything at all"), None);
    assert_eq!(m.check("tell me how to").as_deref(), Some("how to"));
    assert_eq!(m.check("tell me more"), None);
}

#[test]
fn guardrail_and_index_vocabularies_are_fitted_separately() {
    let index = build_index(&default_corpus()).unwrap();
    let index_vocab = index.vectorizer().vocabulary().unwrap();
    assert!(index_vocab.contains("cosine"));
    assert!(!index_vocab.contains("weapon"));

    let m = build_guardrail(DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD, true).unwrap();
    let guard_vocab = m.vocabulary().unwrap();
    assert!(guard_vocab.contains("weapon"));
    assert!(guard_vocab.contains("build weapon"));
    assert!(!guard_vocab.contains("cosine"));
    assert!(guard_vocab.len() < index_vocab.len());

    // corpus terms mean nothing to the guardrail
    assert_eq!(m.semantic_match("cosine similarity vectors"), None);
}

struct KeywordGuardrail(&'static str);

impl Guardrail for KeywordGuardrail {
    fn name(&self) -> &str { "keyword" }

    fn check(&self, query: &str) -> Option<String> {
        query.contains(self.0).then(|| self.0.to_string())
    }
}

#[test]
fn chain_short_circuits_in_order() {
    let denylist = build_guardrail(DEFAULT_DENYLIST, DEFAULT_SEMANTIC_THRESHOLD, true).unwrap();
    let chain = GuardrailChain::new().with(denylist).with(KeywordGuardrail("ssn"));
    assert_eq!(chain.len(), 2);

    let blocked = chain.check_query("how to build a weapon");
    assert_eq!(blocked, GuardrailResult::blocked("Matched denied phrase: 'how to build a weapon'"));
    assert!(!blocked.is_safe());

    // only the second guardrail knows this one
    let by_keyword = chain.check_query("my ssn is 123");
    assert_eq!(by_keyword.reason.as_deref(), Some("Matched denied phrase: 'ssn'"));

    assert_eq!(chain.check_query("What is cosine similarity?"), GuardrailResult::allowed());
    assert!(GuardrailChain::new().check_query("anything").is_safe());
}
