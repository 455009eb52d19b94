pub mod answer;
pub mod error;
pub mod metrics;
pub mod settings;

use anyhow::{Context, Result};
use axum::{
    extract::{FromRequest, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use ragcore::guardrail::DEFAULT_DENYLIST;
use ragcore::{
    default_corpus, is_low_confidence, DenylistMatcher, Document, GuardrailChain, GuardrailConfig, Preset,
    RetrievalConfig, ScoredDocument, SimilarityIndex, VectorizerConfig,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::answer::{synthesize, DEFAULT_MAX_SNIPPETS};
use crate::error::ApiError;
use crate::metrics::{MetricsCollector, MetricsReport};
use crate::settings::Settings;

/// `Json` whose rejections render as `{"detail": ...}` like every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    #[serde(default)]
    pub config: Option<Preset>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrievedSnippet {
    pub id: String,
    pub text: String,
    pub score: f32,
}

impl From<ScoredDocument> for RetrievedSnippet {
    fn from(d: ScoredDocument) -> Self {
        Self { id: d.document.id().to_string(), text: d.document.text().to_string(), score: d.score }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub snippets: Vec<RetrievedSnippet>,
    pub config_used: String,
    pub low_confidence: bool,
}

/// Read-only engine handles built at startup, plus the shared metrics window.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<SimilarityIndex>,
    pub guardrails: Arc<GuardrailChain>,
    pub metrics: Arc<MetricsCollector>,
    pub settings: Arc<Settings>,
    default_retrieval: RetrievalConfig,
}

impl AppState {
    /// Load the corpus and build the index and guardrails. Any failure here is fatal.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let default_retrieval = settings.default_retrieval().context("invalid default retrieval config")?;
        let documents = match &settings.corpus {
            Some(path) => load_corpus(path)?,
            None => default_corpus(),
        };

        let index = SimilarityIndex::build(&documents, VectorizerConfig::default().with_max_features(settings.max_features))
            .context("failed to build similarity index")?;

        let denylist = build_denylist(&settings)?;
        tracing::info!(
            phrases = denylist.phrases().len(),
            semantic = denylist.is_semantic_ready(),
            "guardrails initialized"
        );
        let guardrails = GuardrailChain::new().with(denylist);

        Ok(Self {
            index: Arc::new(index),
            guardrails: Arc::new(guardrails),
            metrics: Arc::new(MetricsCollector::new(settings.max_latency_samples)),
            settings: Arc::new(settings),
            default_retrieval,
        })
    }
}

/// Denylist guardrail with its own vectorizer, fitted on the denylist phrases only.
pub fn build_denylist(settings: &Settings) -> Result<DenylistMatcher> {
    DenylistMatcher::build(
        DEFAULT_DENYLIST,
        GuardrailConfig {
            threshold: settings.guardrail_threshold,
            semantic_enabled: settings.semantic_guardrail,
            vectorizer: VectorizerConfig::default().with_bigrams().with_max_features(settings.max_features),
        },
    )
    .context("failed to build denylist guardrail")
}

/// Read a JSON array of `{"id", "text"}` documents.
pub fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading corpus {}", path.display()))?;
    let documents: Vec<Document> =
        serde_json::from_str(&raw).with_context(|| format!("parsing corpus {}", path.display()))?;
    tracing::info!(num_docs = documents.len(), path = %path.display(), "loaded corpus");
    Ok(documents)
}

pub fn build_app(settings: Settings) -> Result<Router> {
    let state = AppState::from_settings(settings)?;
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(|| async { "ok" }))
        .route("/answer", post(answer_handler))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(state.clone(), track_latency))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "mini-rag",
        "status": "healthy",
        "endpoints": ["/answer", "/metrics", "/health"],
    }))
}

pub async fn answer_handler(
    State(state): State<AppState>,
    AppJson(req): AppJson<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    if req.query.is_empty() {
        return Err(ApiError::Validation("query must not be empty".into()));
    }
    let base = req.config.map(Preset::config).unwrap_or(state.default_retrieval);
    let config = match req.top_k {
        Some(k) => base.with_top_k(k)?,
        None => base,
    };

    state.metrics.incr_total_requests();

    let verdict = state.guardrails.check_query(&req.query);
    if verdict.blocked {
        state.metrics.incr_denylist_hits();
        return Err(ApiError::Blocked(verdict.reason.unwrap_or_default()));
    }

    let documents = state.index.retrieve(&req.query, config.top_k(), config.similarity_metric())?;
    let low_confidence = is_low_confidence(&documents, state.settings.low_conf_threshold);
    if low_confidence {
        state.metrics.incr_low_confidence();
    }
    let answer = synthesize(&documents, DEFAULT_MAX_SNIPPETS);
    tracing::debug!(config = %config, hits = documents.len(), low_confidence, "answered query");

    Ok(Json(AnswerResponse {
        answer,
        snippets: documents.into_iter().map(RetrievedSnippet::from).collect(),
        config_used: config.description(),
        low_confidence,
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.metrics.report())
}

/// Records wall-clock latency for every routed request and echoes it in `X-Latency-Ms`.
async fn track_latency(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    state.metrics.record_latency(latency_ms);
    if let Ok(value) = HeaderValue::from_str(&format!("{latency_ms:.2}")) {
        response.headers_mut().insert("x-latency-ms", value);
    }
    response
}
