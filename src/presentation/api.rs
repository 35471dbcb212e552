// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP surface. Translates external requests into dispatch calls and
// maps the error taxonomy onto HTTP statuses; no business logic lives
// here.
//
// Routes (all JSON, under /api):
//   GET  /api/models       - list the model catalog
//   POST /api/chat         - text chat completion
//   POST /api/chat/vision  - text + image chat completion
//   GET  /api/ping         - health check

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::dispatch::{ChatOutcome, DispatchService};
use crate::domain::error::GatewayError;

pub const SERVICE_NAME: &str = "Multi-Provider LLM API";

pub struct AppState {
    pub dispatch: Arc<DispatchService>,
}

pub fn app(dispatch: Arc<DispatchService>) -> Router {
    let state = Arc::new(AppState { dispatch });

    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/chat", post(chat))
        .route("/api/chat/vision", post(chat_vision))
        .route("/api/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionChatRequestBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub image_content: Option<String>,
    #[serde(default)]
    pub image_media_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseBody {
    pub response: String,
    pub model_id: String,
    pub provider_name: String,
}

impl From<ChatOutcome> for ChatResponseBody {
    fn from(outcome: ChatOutcome) -> Self {
        Self {
            response: outcome.response,
            model_id: outcome.model_id,
            provider_name: outcome.provider.as_str().to_string(),
        }
    }
}

/// Bridges the domain taxonomy onto HTTP. Every failure produces a JSON
/// body with a human-readable `error` string; upstream details are
/// preserved but stack traces never reach the caller.
struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            GatewayError::InvalidInput(_) | GatewayError::UnsupportedCapability { .. } => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            GatewayError::ModelNotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            GatewayError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
            GatewayError::Upstream { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generation failed: {}", self.0),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn bad_body() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Request body must be valid JSON." })),
    )
        .into_response()
}

async fn list_models(State(state): State<Arc<AppState>>) -> Response {
    let catalog = state.dispatch.catalog();
    Json(json!({
        "models": catalog.list(),
        "count": catalog.len(),
    }))
    .into_response()
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = payload else {
        return bad_body();
    };

    match state
        .dispatch
        .chat(
            body.prompt.as_deref().unwrap_or(""),
            body.model_id.as_deref().unwrap_or(""),
        )
        .await
    {
        Ok(outcome) => Json(ChatResponseBody::from(outcome)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn chat_vision(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VisionChatRequestBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = payload else {
        return bad_body();
    };

    match state
        .dispatch
        .vision_chat(
            body.prompt.as_deref().unwrap_or(""),
            body.model_id.as_deref().unwrap_or(""),
            body.image_content.as_deref().unwrap_or(""),
            body.image_media_type.as_deref(),
        )
        .await
    {
        Ok(outcome) => Json(ChatResponseBody::from(outcome)).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn ping() -> Response {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
    .into_response()
}
