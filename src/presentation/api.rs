// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP API
//
// Route table and handlers. Every error leaves as a JSON envelope; provider
// failures get a generic client message with the full detail logged
// server-side.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::ServeDir;
use tracing::error;

use crate::application::{ChatGateway, ConversationStore};
use crate::domain::chat::ChatMessage;
use crate::domain::llm::{GatewayError, ProviderId};
use crate::domain::prompt::render_template;
use crate::domain::repository::{PromptRepository, RepositoryError};
use crate::infrastructure::export::ExportWriter;
use crate::infrastructure::llm::{anthropic::ANTHROPIC_MODELS, openai::OPENAI_MODELS};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

pub struct AppState {
    pub gateway: ChatGateway,
    pub history: Arc<ConversationStore>,
    pub prompts: Arc<dyn PromptRepository>,
    pub exporter: ExportWriter,
    pub start_time: Instant,
}

pub fn app(state: AppState, static_dir: &FsPath) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/chat", post(chat))
        .route("/compare", post(compare))
        .route("/prompts", get(list_prompts).post(create_prompt))
        .route("/prompts/{id}", put(update_prompt).delete(delete_prompt))
        .route("/export", get(export_history))
        .route("/clear", post(clear_history))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Map an outbound-path failure onto the response contract: client mistakes
/// are 400s with their own message, upstream failures are a generic 500.
fn gateway_error_response(e: GatewayError) -> Response {
    match &e {
        GatewayError::UnsupportedProvider(_) => {
            error_json(StatusCode::BAD_REQUEST, e.to_string())
        }
        other => {
            error!(error = %other, "provider call failed");
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get response from AI API",
            )
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn models() -> Json<serde_json::Value> {
    Json(json!({
        "openai": OPENAI_MODELS,
        "anthropic": ANTHROPIC_MODELS,
    }))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    let provider = match req.provider.parse::<ProviderId>() {
        Ok(p) => p,
        Err(e) => return error_json(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let system_prompt = render_template(
        req.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT),
        &req.variables,
    );

    let key = ConversationStore::key(provider, &req.model);
    let user_turn = ChatMessage::user(&req.message);

    // Read-before-call: prior history plus this turn goes upstream; the
    // buffer itself is only touched after a successful reply.
    let mut outbound = state.history.snapshot(&key);
    outbound.push(user_turn.clone());

    match state
        .gateway
        .send_with_retry(provider, &req.model, &system_prompt, &outbound)
        .await
    {
        Ok(reply) => {
            let assistant_turn = ChatMessage::assistant(&reply, &req.model);
            state.history.record_exchange(&key, user_turn, assistant_turn);
            Json(json!({ "message": reply })).into_response()
        }
        Err(e) => gateway_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub message: String,
    pub providers: Vec<String>,
    pub models: Vec<String>,
    pub system_prompt: Option<String>,
}

async fn compare(State(state): State<Arc<AppState>>, Json(req): Json<CompareRequest>) -> Response {
    if req.providers.is_empty() || req.providers.len() != req.models.len() {
        return error_json(
            StatusCode::BAD_REQUEST,
            "providers and models must be non-empty and the same length",
        );
    }

    let mut pairs = Vec::with_capacity(req.providers.len());
    for (provider, model) in req.providers.iter().zip(&req.models) {
        match provider.parse::<ProviderId>() {
            Ok(p) => pairs.push((p, model.clone())),
            Err(e) => return error_json(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    let system_prompt = req.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);

    match state.gateway.compare(&pairs, &req.message, system_prompt).await {
        Ok(results) => Json(json!({ "results": results })).into_response(),
        Err(e) => gateway_error_response(e),
    }
}

#[derive(Deserialize)]
pub struct PromptBody {
    pub name: String,
    pub content: String,
}

async fn list_prompts(State(state): State<Arc<AppState>>) -> Response {
    match state.prompts.list().await {
        Ok(prompts) => Json(prompts).into_response(),
        Err(e) => repository_error_response(e),
    }
}

async fn create_prompt(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PromptBody>,
) -> Response {
    match state.prompts.create(&body.name, &body.content).await {
        Ok(prompt) => (StatusCode::CREATED, Json(prompt)).into_response(),
        Err(e) => repository_error_response(e),
    }
}

async fn update_prompt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<PromptBody>,
) -> Response {
    match state.prompts.update(id, &body.name, &body.content).await {
        Ok(0) => error_json(StatusCode::NOT_FOUND, "Prompt not found"),
        Ok(_) => Json(json!({
            "id": id,
            "name": body.name,
            "content": body.content,
        }))
        .into_response(),
        Err(e) => repository_error_response(e),
    }
}

async fn delete_prompt(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.prompts.delete(id).await {
        Ok(0) => error_json(StatusCode::NOT_FOUND, "Prompt not found"),
        Ok(changes) => Json(json!({
            "message": "Prompt deleted",
            "changes": changes,
        }))
        .into_response(),
        Err(e) => repository_error_response(e),
    }
}

fn repository_error_response(e: RepositoryError) -> Response {
    match &e {
        RepositoryError::DuplicateName(_) => error_json(StatusCode::BAD_REQUEST, e.to_string()),
        RepositoryError::Database(detail) => {
            error!(error = %detail, "prompt store failure");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Prompt store failure")
        }
    }
}

async fn export_history(State(state): State<Arc<AppState>>) -> Response {
    let bundles = state.history.bundles();
    if bundles.is_empty() {
        return error_json(StatusCode::NOT_FOUND, "No chat history to export");
    }

    match state.exporter.write_all(&bundles).await {
        Ok(files) => Json(json!({
            "message": "Chat history exported successfully",
            "files": files,
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "chat log export failed");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to export chat log")
        }
    }
}

async fn clear_history(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let cleared = state.history.clear();
    tracing::info!(buffers = cleared, "chat history cleared");
    Json(json!({ "message": "Chat history cleared successfully" }))
}
