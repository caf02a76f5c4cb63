//! Static catalogue of the remote providers a model can be routed to.

use crate::models::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

#[derive(Debug)]
pub struct ProviderSeed {
    pub id: &'static str,
    pub kind: ProviderKind,
    pub model: ModelId,
    pub display: &'static str,
    pub description: &'static str,
    pub base_url: &'static str,
    pub default_model: &'static str,
    /// Environment variable holding the credential.
    pub env_key: &'static str,
    pub base_url_env: &'static str,
    pub model_env: &'static str,
}

pub const PROVIDER_SEEDS: &[ProviderSeed] = &[
    ProviderSeed {
        id: "openai",
        kind: ProviderKind::OpenAi,
        model: ModelId::Gpt4,
        display: "OpenAI",
        description: "Chat completions API",
        base_url: "https://api.openai.com",
        default_model: "gpt-4",
        env_key: "OPENAI_API_KEY",
        base_url_env: "VIBES_OPENAI_BASE_URL",
        model_env: "VIBES_OPENAI_MODEL",
    },
    ProviderSeed {
        id: "google",
        kind: ProviderKind::Gemini,
        model: ModelId::Gemini,
        display: "Google Gemini",
        description: "generateContent API",
        base_url: "https://generativelanguage.googleapis.com/v1beta",
        default_model: "gemini-2.0-flash",
        env_key: "GEMINI_API_KEY",
        base_url_env: "VIBES_GEMINI_BASE_URL",
        model_env: "VIBES_GEMINI_MODEL",
    },
];

pub fn seed_for(model: ModelId) -> Option<&'static ProviderSeed> {
    PROVIDER_SEEDS.iter().find(|seed| seed.model == model)
}

pub fn seed_by_id(id: &str) -> Option<&'static ProviderSeed> {
    PROVIDER_SEEDS.iter().find(|seed| seed.id == id)
}
