//! Axum router construction.
//!
//! [`build`] assembles the application router: the two provider proxies, the
//! chat API, health and diagnostics, all behind the trace middleware.

mod chats;
mod diagnostics;
mod health;
mod proxy;

use std::sync::Arc;

use axum::body::Bytes;
use axum::{middleware, Router};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::middleware::trace_middleware;
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(proxy::router())
        .merge(chats::router())
        .merge(diagnostics::router())
        .layer(middleware::from_fn(trace_middleware))
        .with_state(state)
}

/// Decode a JSON body by hand so malformed input gets the same
/// `{success, error}` shape as every other failure.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::BadRequest(format!("invalid JSON body: {err}")))
}
