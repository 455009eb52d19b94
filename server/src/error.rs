use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ragcore::EngineError;

/// Request-level failures, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// Query stopped by a guardrail.
    Blocked(String),
    /// Request body could not be read as the expected JSON.
    Body(JsonRejection),
    /// Request body passed deserialization but not validation.
    Validation(String),
    Engine(EngineError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self { ApiError::Body(rejection) }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self { ApiError::Engine(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Blocked(reason) => (StatusCode::BAD_REQUEST, format!("Query blocked by guardrail. {reason}")),
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Engine(e) if e.is_client_error() => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::Engine(e) => {
                tracing::error!(error = %e, "engine failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
