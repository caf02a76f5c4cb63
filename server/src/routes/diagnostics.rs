//! Model roster and recent runtime events.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use vibes_core::agents::AiProviderInfo;
use vibes_core::fanout::RosterEntry;
use vibes_core::logging::EventRecord;

use crate::state::AppState;

const DEFAULT_EVENT_LIMIT: usize = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/events", get(list_events))
}

#[derive(Serialize)]
struct ModelsView {
    roster: Vec<RosterEntry>,
    providers: Vec<AiProviderInfo>,
}

#[derive(Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
    module: Option<String>,
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsView> {
    Json(ModelsView {
        roster: state.coordinator.describe_roster(),
        providers: state.config.runtime.list_providers(),
    })
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    let limit = Some(query.limit.unwrap_or(DEFAULT_EVENT_LIMIT));
    let events = match query.module.as_deref() {
        Some(module) => state.events.recent_for(module, limit),
        None => state.events.recent(limit),
    };
    Json(events)
}
