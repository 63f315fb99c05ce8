use axum::{
    Json, Router,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use include_dir::{include_dir, Dir};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    models::{ApiStatus, ErrorBody, GenerationMode, GenerationRequest, StatusKind},
    openai::{preview, ChatBackend, ChatRequest, OpenAiError},
    prompt::build_prompt,
    trends::TrendProber,
};

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    /// Output budget for the main generation call.
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("URL is required")] MissingUrl,
    #[error("Invalid request body: {0}")] InvalidBody(String),
    #[error(transparent)] Upstream(#[from] OpenAiError),
    #[error("Failed to parse API response")] Decode,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Decode => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate-content", post(generate_content))
        .route("/api/generate-trends", post(generate_trends))
        .route("/api/check-api-status", get(check_api_status))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn index() -> Response {
    match STATIC_DIR.get_file("index.html").and_then(|f| f.contents_utf8()) {
        Some(page) => Html(page).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn generate_content(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    run_generation(&state, body, GenerationMode::Content).await
}

pub async fn generate_trends(
    State(state): State<AppState>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    run_generation(&state, body, GenerationMode::AiTrends).await
}

async fn run_generation(
    state: &AppState,
    body: Result<Json<GenerationRequest>, JsonRejection>,
    mode: GenerationMode,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
    let url = request.url().ok_or(ApiError::MissingUrl)?.to_string();

    let span = info_span!("generate", request_id = %Uuid::new_v4(), ?mode, %url);
    async {
        info!("🚀 Generating ideas for {} (platform: {})", url, request.platform().unwrap_or("all"));

        let trends_context = TrendProber::new(state.backend.as_ref(), mode).probe(&url, request.platform()).await;
        let prompt = build_prompt(&request, &url, &trends_context, mode);

        let completion = ChatRequest::system(prompt).max_tokens(state.max_tokens).json();
        let text = state.backend.complete(&completion).await.map_err(|e| {
            error!("❌ Generation call failed: {}", e);
            ApiError::Upstream(e)
        })?;

        // No content from the model is answered as an empty object.
        let text = if text.trim().is_empty() { "{}".to_string() } else { text };
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            error!("❌ Error parsing JSON response: {}", e);
            error!("Raw response: {}", text);
            ApiError::Decode
        })?;

        info!("✅ Generated response ({} chars): {}", text.len(), preview(&text, 200));
        Ok::<_, ApiError>(Json(value))
    }
    .instrument(span)
    .await
}

pub async fn check_api_status(State(state): State<AppState>) -> (StatusCode, Json<ApiStatus>) {
    if !state.backend.is_configured() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiStatus { status: StatusKind::Error, message: "OpenAI API key not configured".into(), error: None }),
        );
    }

    match state.backend.complete(&ChatRequest::user("Test").max_tokens(5).without_temperature()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiStatus { status: StatusKind::Ok, message: "API is working correctly".into(), error: None }),
        ),
        Err(e) => {
            error!("❌ OpenAI API test failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiStatus { status: StatusKind::Error, message: "OpenAI API test failed".into(), error: Some(e.to_string()) }),
            )
        }
    }
}
