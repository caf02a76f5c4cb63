use thiserror::Error;

use crate::models::ModelId;

#[derive(Debug, Error)]
pub enum VibesError {
    #[error("Missing {env_key}")]
    MissingCredential { provider: ModelId, env_key: &'static str },
    #[error("{provider} API error (status {status})")]
    Upstream { provider: ModelId, status: u16 },
    #[error("{provider} request failed: {message}")]
    Transport { provider: ModelId, message: String },
    #[error("{provider} returned an unreadable reply")]
    MalformedReply { provider: ModelId },
    #[error("Missing or invalid prompt")]
    InvalidPrompt,
    #[error("Chat title must not be empty")]
    InvalidTitle,
    #[error("Chat not found: {0}")]
    ChatNotFound(String),
    #[error("A response is still pending for chat {0}")]
    TurnInProgress(String),
    #[error("Fan-out join failed: {0}")]
    FanOutFault(String),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

impl VibesError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "CFG-1001",
            Self::Upstream { .. } => "AI-1001",
            Self::Transport { .. } => "AI-1002",
            Self::MalformedReply { .. } => "AI-1003",
            Self::InvalidPrompt => "REQ-1001",
            Self::InvalidTitle => "REQ-1002",
            Self::ChatNotFound(_) => "CHT-1001",
            Self::TurnInProgress(_) => "CHT-1002",
            Self::FanOutFault(_) => "AI-1100",
            Self::UnknownModel(_) => "CFG-1002",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => {
                "The provider credential is not configured; set it in the environment and restart."
            }
            Self::Upstream { .. } => "The provider answered with a non-success HTTP status.",
            Self::Transport { .. } => {
                "The provider could not be reached or the request timed out."
            }
            Self::MalformedReply { .. } => "The provider reply did not contain any text.",
            Self::InvalidPrompt => "The request body must be JSON with a non-empty string prompt.",
            Self::InvalidTitle => "Chat titles need at least one visible character.",
            Self::ChatNotFound(_) => "No chat exists for the requested ID.",
            Self::TurnInProgress(_) => {
                "Wait for the current answers before sending another prompt to this chat."
            }
            Self::FanOutFault(_) => "An adapter task aborted before producing a response.",
            Self::UnknownModel(_) => "The model name is not one of GPT-4, Claude, Gemini or Llama.",
        }
    }

    /// Whether the fault lives in configuration rather than in the request
    /// or the provider.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::UnknownModel(_)
        )
    }
}
