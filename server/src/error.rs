//! Unified handler error.
//!
//! Every failure body has the shape `{"success": false, "error": "..."}`.
//! Internal faults are logged in full and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use vibes_core::VibesError;

pub const GENERATION_FAILED: &str = "Failed to generate content";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// Provider failure whose message is safe to show.
    Upstream(String),
    /// Any failure behind the Gemini proxy; the detail is only logged.
    Generation(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Upstream(m) => {
                log::warn!(target: "http", "provider failure: {m}");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
            ApiError::Generation(detail) => {
                log::error!(target: "http", "gemini proxy failure: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED.to_owned())
            }
            ApiError::Internal(detail) => {
                log::error!(target: "http", "internal error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<VibesError> for ApiError {
    fn from(err: VibesError) -> Self {
        match err {
            VibesError::InvalidPrompt | VibesError::InvalidTitle => {
                ApiError::BadRequest(err.to_string())
            }
            VibesError::ChatNotFound(_) => ApiError::NotFound(err.to_string()),
            VibesError::TurnInProgress(_) => ApiError::Conflict(err.to_string()),
            VibesError::MissingCredential { .. }
            | VibesError::Upstream { .. }
            | VibesError::Transport { .. }
            | VibesError::MalformedReply { .. } => ApiError::Upstream(err.to_string()),
            VibesError::FanOutFault(_) | VibesError::UnknownModel(_) => {
                ApiError::Internal(format!("[{}] {err}", err.code()))
            }
        }
    }
}
