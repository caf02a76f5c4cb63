//! Chat API.
//!
//! The store lock is only held for the synchronous mutation; a message turn
//! releases it while the fan-out runs, then re-acquires it to append the
//! assistant turn. The fan-out half of a turn runs on its own task, so a
//! client that disconnects early does not strand the chat.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use vibes_core::Chat;

use super::parse_body;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chats", get(list_chats).post(create_chat))
        .route(
            "/api/chats/{id}",
            get(get_chat).patch(rename_chat).delete(delete_chat),
        )
        .route("/api/chats/{id}/select", post(select_chat))
        .route("/api/chats/{id}/messages", post(send_message))
}

#[derive(Deserialize)]
struct ListQuery {
    q: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatList {
    chats: Vec<Chat>,
    active_chat_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Selection {
    active_chat_id: Option<String>,
}

#[derive(Deserialize)]
struct RenameBody {
    title: String,
}

#[derive(Deserialize)]
struct MessageBody {
    prompt: String,
}

async fn list_chats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ChatList>, ApiError> {
    let store = state.chats()?;
    let chats = match query.q.as_deref() {
        Some(q) => store.search(q),
        None => store.chats().as_ref().clone(),
    };
    Ok(Json(ChatList {
        chats,
        active_chat_id: store.active_id().map(str::to_owned),
    }))
}

async fn create_chat(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let chat = state.chats()?.create_chat(OffsetDateTime::now_utc());
    Ok((StatusCode::CREATED, Json(chat)))
}

async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Chat>, ApiError> {
    let store = state.chats()?;
    store
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Chat not found: {id}")))
}

async fn rename_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Chat>, ApiError> {
    let RenameBody { title } = parse_body(&body)?;
    let chat = state
        .chats()?
        .rename(&id, &title, OffsetDateTime::now_utc())?;
    Ok(Json(chat))
}

async fn select_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Chat>, ApiError> {
    let mut store = state.chats()?;
    let chat = store.select(&id)?.clone();
    Ok(Json(chat))
}

async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Selection>, ApiError> {
    let active_chat_id = state.chats()?.delete(&id)?;
    Ok(Json(Selection { active_chat_id }))
}

/// One full turn: record the prompt, ask every roster model, record the
/// answers. A fan-out fault leaves the user turn in place. A chat that is
/// still waiting for answers rejects the prompt with 409.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Chat>, ApiError> {
    let MessageBody { prompt } = parse_body(&body)?;
    let chat = state
        .chats()?
        .apply_user_turn(&id, &prompt, OffsetDateTime::now_utc())?;
    let prompt = chat
        .messages
        .last()
        .map(|m| m.content.clone())
        .unwrap_or(prompt);

    let turn = tokio::spawn(finish_turn(Arc::clone(&state), id.clone(), prompt));
    match turn.await {
        Ok(result) => result.map(Json),
        Err(err) => {
            if let Ok(mut store) = state.chats() {
                store.abandon_turn(&id);
            }
            Err(ApiError::Internal(format!("turn task for chat {id} failed: {err}")))
        }
    }
}

async fn finish_turn(state: Arc<AppState>, id: String, prompt: String) -> Result<Chat, ApiError> {
    match state.coordinator.ask_roster(&prompt).await {
        Ok(responses) => {
            let chat = state
                .chats()?
                .apply_assistant_turn(&id, responses, OffsetDateTime::now_utc())?;
            Ok(chat)
        }
        Err(err) => {
            if let Ok(mut store) = state.chats() {
                store.abandon_turn(&id);
            }
            Err(err.into())
        }
    }
}
