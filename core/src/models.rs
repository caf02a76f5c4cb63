//! Model identifiers and the per-model response record produced by a fan-out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::VibesError;

/// The models a prompt can be fanned out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "GPT-4")]
    Gpt4,
    #[serde(rename = "Claude")]
    Claude,
    #[serde(rename = "Gemini")]
    Gemini,
    #[serde(rename = "Llama")]
    Llama,
}

impl ModelId {
    pub const ALL: [ModelId; 4] = [
        ModelId::Gpt4,
        ModelId::Claude,
        ModelId::Gemini,
        ModelId::Llama,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ModelId::Gpt4 => "GPT-4",
            ModelId::Claude => "Claude",
            ModelId::Gemini => "Gemini",
            ModelId::Llama => "Llama",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelId {
    type Err = VibesError;

    /// Accepts the display name in any case, plus `gpt4` without the dash.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpt-4" | "gpt4" => Ok(ModelId::Gpt4),
            "claude" => Ok(ModelId::Claude),
            "gemini" => Ok(ModelId::Gemini),
            "llama" => Ok(ModelId::Llama),
            _ => Err(VibesError::UnknownModel(s.trim().to_string())),
        }
    }
}

/// Confidence score in `0..=100`. Zero marks a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const FAILED: Confidence = Confidence(0);

    /// Values above 100 are clamped.
    pub fn new(value: u8) -> Self {
        Confidence(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_failure(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<u8> for Confidence {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(format!("confidence {value} is outside 0..=100"));
        }
        Ok(Confidence(value))
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: ModelId,
    pub response: String,
    pub confidence: Confidence,
}

impl ModelResponse {
    pub fn success(model: ModelId, response: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            model,
            response: response.into(),
            confidence,
        }
    }

    /// Failure-shaped entry: placeholder text and confidence 0.
    pub fn failure(model: ModelId) -> Self {
        Self {
            model,
            response: format!("Error fetching {model} response."),
            confidence: Confidence::FAILED,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.confidence.is_failure()
    }
}
