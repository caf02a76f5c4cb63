//! Single-provider proxy endpoints.
//!
//! `/api/llm` forwards to Gemini and hides every failure behind one generic
//! message. `/api/openai` forwards to OpenAI, answers 400 for a bad prompt and
//! passes provider errors through.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use vibes_core::{ModelId, VibesError};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/llm", post(gemini_proxy))
        .route("/api/openai", post(openai_proxy))
}

#[derive(Deserialize)]
struct PromptBody {
    prompt: Option<Value>,
}

/// The prompt must be a string with at least one visible character.
fn read_prompt(body: &Bytes) -> Result<String, VibesError> {
    let parsed: PromptBody = serde_json::from_slice(body).map_err(|_| VibesError::InvalidPrompt)?;
    match parsed.prompt {
        Some(Value::String(prompt)) if !prompt.trim().is_empty() => Ok(prompt),
        _ => Err(VibesError::InvalidPrompt),
    }
}

async fn gemini_proxy(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let prompt = read_prompt(&body).map_err(|err| ApiError::Generation(err.to_string()))?;
    let adapter = state
        .remote(ModelId::Gemini)
        .map_err(|_| ApiError::Generation("gemini adapter missing".to_owned()))?;
    let reply = adapter
        .complete(&prompt)
        .await
        .map_err(|err| ApiError::Generation(format!("[{}] {err}", err.code())))?;
    Ok(Json(json!({ "success": true, "reply": reply })))
}

async fn openai_proxy(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let prompt = read_prompt(&body)?;
    let adapter = state.remote(ModelId::Gpt4)?;
    let reply = adapter.complete(&prompt).await?;
    Ok(Json(json!({ "success": true, "reply": reply })))
}
