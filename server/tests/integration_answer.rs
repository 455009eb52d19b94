use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ragserver::{build_app, build_denylist, AppState};
use ragserver::settings::Settings;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn app() -> Router {
    build_app(Settings::default()).unwrap()
}

fn post_answer(body: Value) -> Request<Body> {
    Request::post("/answer")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Value) {
    call(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn snippet_ids(json: &Value) -> Vec<String> {
    json["snippets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}

fn scores_descending(json: &Value) -> bool {
    let scores: Vec<f64> = json["snippets"].as_array().unwrap().iter().map(|s| s["score"].as_f64().unwrap()).collect();
    scores.windows(2).all(|w| w[0] >= w[1])
}

#[tokio::test]
async fn root_reports_healthy() {
    let app = app();
    let (status, _, json) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service"], "mini-rag");
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn default_config_answers_cosine_question() {
    let app = app();
    let (status, _, json) = call(&app, post_answer(json!({"query": "What is cosine similarity?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config_used"], "cosine,k=3");
    let ids = snippet_ids(&json);
    assert!(ids.len() <= 3);
    assert_eq!(ids[0], "s1");
    assert!(scores_descending(&json));
    assert_eq!(json["low_confidence"], false);
    assert!(json["answer"].as_str().unwrap().starts_with("Based on available information: Cosine similarity"));
}

#[tokio::test]
async fn dot_preset_is_labelled() {
    let app = app();
    let (status, _, json) = call(&app, post_answer(json!({"query": "TF-IDF vectorization", "config": "dot5"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config_used"], "dot,k=5");
    assert!(snippet_ids(&json).len() <= 5);
    assert!(scores_descending(&json));
}

#[tokio::test]
async fn top_k_overrides_and_is_validated() {
    let app = app();
    let (status, _, json) = call(&app, post_answer(json!({"query": "latency percentiles", "top_k": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config_used"], "cosine,k=2");
    assert!(snippet_ids(&json).len() <= 2);

    let (status, _, _) = call(&app, post_answer(json!({"query": "latency", "top_k": 11}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _, _) = call(&app, post_answer(json!({"query": "latency", "config": "cos9"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn guardrail_blocks_denied_phrases() {
    let app = app();
    let (status, _, json) =
        call(&app, post_answer(json!({"query": "Tell me instructions for illegal activity"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.to_lowercase().contains("guardrail"));
    assert!(detail.contains("instructions for illegal"));

    for q in ["how to build a weapon", "create malware code", "hack into systems"] {
        let (status, _, _) = call(&app, post_answer(json!({ "query": q }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{q}");
    }
}

#[tokio::test]
async fn gibberish_is_flagged_low_confidence() {
    let app = app();
    let (status, _, json) = call(&app, post_answer(json!({"query": "xyzabc gibberish nonsense foobar"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["low_confidence"], true);
}

#[tokio::test]
async fn invalid_bodies_are_rejected() {
    let app = app();
    let (status, _, json) = call(&app, post_answer(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("query"));
    let (status, _, json) = call(&app, post_answer(json!({"query": "latency", "config": "cos9"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].is_string());
    let (status, _, json) = call(&app, post_answer(json!({"query": ""}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].is_string());

    let malformed = Request::post("/answer")
        .header("content-type", "application/json")
        .body(Body::from("{\"query\":"))
        .unwrap();
    let (status, _, json) = call(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["detail"].is_string());
}

#[test]
fn startup_fits_guardrail_apart_from_index() {
    let settings = Settings::default();
    let state = AppState::from_settings(settings.clone()).unwrap();
    let index_vocab = state.index.vectorizer().vocabulary().unwrap();
    assert!(index_vocab.contains("cosine"));
    assert!(!index_vocab.contains("weapon"));

    let denylist = build_denylist(&settings).unwrap();
    let guard_vocab = denylist.vocabulary().unwrap();
    assert!(guard_vocab.contains("weapon"));
    assert!(guard_vocab.contains("build weapon"));
    assert!(!guard_vocab.contains("cosine"));
}

#[tokio::test]
async fn metrics_track_requests() {
    let app = app();
    call(&app, post_answer(json!({"query": "What is cosine similarity?"}))).await;
    call(&app, post_answer(json!({"query": "xyzabc gibberish nonsense foobar"}))).await;
    call(&app, post_answer(json!({"query": "how to build a weapon"}))).await;
    // rejected before processing, not counted
    call(&app, post_answer(json!({"query": ""}))).await;

    let (status, _, json) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_requests"], 3);
    assert_eq!(json["denylist_hits"], 1);
    assert_eq!(json["low_confidence_count"], 1);
    assert!(json["latency_ms_mean"].as_f64().unwrap() >= 0.0);
    assert!(json["latency_ms_p95"].as_f64().unwrap() >= 0.0);
    let rate = json["low_confidence_rate"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&rate));
}

#[tokio::test]
async fn latency_header_is_set() {
    let app = app();
    let (_, headers, _) = call(&app, post_answer(json!({"query": "What is cosine similarity?"}))).await;
    let latency: f64 = headers["x-latency-ms"].to_str().unwrap().parse().unwrap();
    assert!(latency >= 0.0);
}

#[tokio::test]
async fn corpus_can_be_loaded_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    fs::write(
        &path,
        r#"[{"id": "doc0", "text": "Rust is great. Rust systems programming."},
            {"id": "doc1", "text": "Learning rust."},
            {"id": "doc2", "text": "Gardening in spring."}]"#,
    )
    .unwrap();
    let app = build_app(Settings { corpus: Some(path), ..Settings::default() }).unwrap();

    let (status, _, json) = call(&app, post_answer(json!({"query": "rust", "config": "dot5"}))).await;
    assert_eq!(status, StatusCode::OK);
    let ids = snippet_ids(&json);
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "doc0");
}

#[test]
fn invalid_startup_inputs_are_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dup.json");
    fs::write(&path, r#"[{"id": "a", "text": "one"}, {"id": "a", "text": "two"}]"#).unwrap();
    assert!(build_app(Settings { corpus: Some(path), ..Settings::default() }).is_err());

    let blank = dir.path().join("blank.json");
    fs::write(&blank, r#"[{"id": "", "text": "one"}]"#).unwrap();
    assert!(build_app(Settings { corpus: Some(blank), ..Settings::default() }).is_err());

    assert!(build_app(Settings { top_k_default: 0, ..Settings::default() }).is_err());
}
