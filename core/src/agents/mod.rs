pub mod config;
pub mod providers;
pub mod remote;
pub mod simulated;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;

pub use config::{AiProviderInfo, ProviderSettings, RuntimeSettings};
pub use remote::RemoteAdapter;
pub use simulated::SimulatedAdapter;

use crate::models::{ModelId, ModelResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Remote,
    Simulated,
}

/// One model behind one capability. Implementations are total: every failure
/// is folded into a confidence-0 [`ModelResponse`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn model(&self) -> ModelId;

    fn kind(&self) -> AdapterKind;

    async fn invoke(&self, prompt: &str) -> ModelResponse;
}

/// Every adapter the process owns, built once at startup.
pub struct AdapterSet {
    remote: HashMap<ModelId, Arc<RemoteAdapter>>,
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl AdapterSet {
    /// Remote adapters exist for every seeded provider so the proxy endpoints
    /// work regardless of fan-out wiring. Each model gets exactly one fan-out
    /// adapter: remote when listed as live, canned otherwise.
    pub fn from_settings(settings: &RuntimeSettings) -> Result<Self> {
        let client = remote::build_client(settings.timeout)?;

        let mut remote = HashMap::new();
        for provider in &settings.providers {
            remote.insert(
                provider.seed.model,
                Arc::new(RemoteAdapter::new(client.clone(), provider.clone())),
            );
        }

        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        for model in ModelId::ALL {
            if settings.is_live(model) {
                let adapter = remote
                    .get(&model)
                    .cloned()
                    .ok_or_else(|| anyhow!("{model} has no remote provider"))?;
                adapters.push(adapter);
            } else {
                adapters.push(Arc::new(SimulatedAdapter::new(model)));
            }
        }

        Ok(Self { remote, adapters })
    }

    pub fn remote(&self, model: ModelId) -> Option<Arc<RemoteAdapter>> {
        self.remote.get(&model).cloned()
    }

    pub fn adapters(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        self.adapters.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_models_get_remote_adapters() {
        let settings = RuntimeSettings::from_lookup(|key| match key {
            "VIBES_LIVE_MODELS" => Some("GPT-4".to_string()),
            _ => None,
        })
        .unwrap();
        let set = AdapterSet::from_settings(&settings).unwrap();

        let kinds: Vec<(ModelId, AdapterKind)> = set
            .adapters()
            .iter()
            .map(|a| (a.model(), a.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ModelId::Gpt4, AdapterKind::Remote),
                (ModelId::Claude, AdapterKind::Simulated),
                (ModelId::Gemini, AdapterKind::Simulated),
                (ModelId::Llama, AdapterKind::Simulated),
            ]
        );
        assert!(set.remote(ModelId::Gemini).is_some());
        assert!(set.remote(ModelId::Claude).is_none());
    }
}
