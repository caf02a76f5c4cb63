use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use super::providers::{ProviderSeed, PROVIDER_SEEDS};
use crate::logging::DEFAULT_EVENT_CAPACITY;
use crate::models::ModelId;

pub const DEFAULT_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_FANOUT_MODELS: &str = "GPT-4,Claude,Gemini,Llama";
pub const DEFAULT_LIVE_MODELS: &str = "Gemini";

/// Resolved settings for one remote provider. The credential is read once,
/// here, and never re-read per request.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub seed: &'static ProviderSeed,
    pub base_url: String,
    pub upstream_model: String,
    pub secret: Option<String>,
}

impl ProviderSettings {
    pub fn has_credentials(&self) -> bool {
        self.secret.is_some()
    }
}

/// Read-only view of a provider, safe to hand to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AiProviderInfo {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub base_url: String,
    pub upstream_model: String,
    pub model: ModelId,
    pub has_credentials: bool,
}

impl From<&ProviderSettings> for AiProviderInfo {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            id: settings.seed.id.to_string(),
            display_name: settings.seed.display.to_string(),
            description: settings.seed.description.to_string(),
            base_url: settings.base_url.clone(),
            upstream_model: settings.upstream_model.clone(),
            model: settings.seed.model,
            has_credentials: settings.has_credentials(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub providers: Vec<ProviderSettings>,
    pub timeout: Duration,
    /// Models asked on every turn, in display order.
    pub fanout_models: Vec<ModelId>,
    /// Models served by a remote adapter instead of a canned one.
    pub live_models: Vec<ModelId>,
    pub event_capacity: usize,
}

impl RuntimeSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let providers = PROVIDER_SEEDS
            .iter()
            .map(|seed| ProviderSettings {
                seed,
                base_url: read(seed.base_url_env).unwrap_or_else(|| seed.base_url.to_string()),
                upstream_model: read(seed.model_env)
                    .unwrap_or_else(|| seed.default_model.to_string()),
                secret: read(seed.env_key),
            })
            .collect();

        let timeout_secs = match read("VIBES_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("VIBES_HTTP_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("VIBES_HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        let fanout_models = parse_model_list(
            &read("VIBES_FANOUT_MODELS").unwrap_or_else(|| DEFAULT_FANOUT_MODELS.to_string()),
        )
        .context("invalid VIBES_FANOUT_MODELS")?;
        if fanout_models.is_empty() {
            return Err(anyhow!("VIBES_FANOUT_MODELS must name at least one model"));
        }

        let live_models = parse_model_list(
            &read("VIBES_LIVE_MODELS").unwrap_or_else(|| DEFAULT_LIVE_MODELS.to_string()),
        )
        .context("invalid VIBES_LIVE_MODELS")?;

        let event_capacity = match read("VIBES_EVENT_CAPACITY") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("VIBES_EVENT_CAPACITY is not a number: {raw}"))?,
            None => DEFAULT_EVENT_CAPACITY,
        };
        if event_capacity == 0 {
            return Err(anyhow!("VIBES_EVENT_CAPACITY must be greater than zero"));
        }

        let settings = Self {
            providers,
            timeout: Duration::from_secs(timeout_secs),
            fanout_models,
            live_models,
            event_capacity,
        };

        for model in &settings.live_models {
            if settings.provider(*model).is_none() {
                return Err(anyhow!("{model} has no remote provider and cannot be live"));
            }
        }

        Ok(settings)
    }

    pub fn provider(&self, model: ModelId) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.seed.model == model)
    }

    pub fn is_live(&self, model: ModelId) -> bool {
        self.live_models.contains(&model)
    }

    /// Live providers whose credential is absent.
    pub fn missing_credentials(&self) -> Vec<&ProviderSettings> {
        self.live_models
            .iter()
            .filter_map(|model| self.provider(*model))
            .filter(|p| !p.has_credentials())
            .collect()
    }

    pub fn list_providers(&self) -> Vec<AiProviderInfo> {
        self.providers.iter().map(AiProviderInfo::from).collect()
    }
}

/// Parse a comma separated list of model names, dropping duplicates while
/// keeping first-seen order.
pub fn parse_model_list(raw: &str) -> Result<Vec<ModelId>> {
    let mut models = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let model: ModelId = name.parse()?;
        if !models.contains(&model) {
            models.push(model);
        }
    }
    Ok(models)
}
