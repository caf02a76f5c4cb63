//! Shared application state injected into every axum handler.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use log::Level;
use serde_json::json;
use vibes_core::agents::{AdapterSet, RemoteAdapter};
use vibes_core::logging::EventLog;
use vibes_core::{ChatStore, FanOutCoordinator, ModelId};

use crate::config::Config;
use crate::error::ApiError;

pub struct AppState {
    pub config: Arc<Config>,
    pub adapters: AdapterSet,
    pub coordinator: FanOutCoordinator,
    pub events: Arc<EventLog>,
    chats: Mutex<ChatStore>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let events = Arc::new(EventLog::new(config.runtime.event_capacity));
        let adapters = AdapterSet::from_settings(&config.runtime)?;
        let coordinator = FanOutCoordinator::new(
            adapters.adapters(),
            config.runtime.fanout_models.clone(),
            Arc::clone(&events),
        );

        for provider in config.runtime.missing_credentials() {
            events.record(
                Level::Warn,
                Some("CFG-0001"),
                "config",
                "Live provider has no credential",
                Some("Its fan-out entries will report confidence 0 until the key is set"),
                Some(json!({
                    "provider": provider.seed.id,
                    "env_key": provider.seed.env_key,
                })),
            );
        }

        Ok(Self {
            chats: Mutex::new(ChatStore::new(Arc::clone(&events))),
            config: Arc::new(config),
            adapters,
            coordinator,
            events,
        })
    }

    /// Lock the chat store. Callers must drop the guard before awaiting.
    pub fn chats(&self) -> Result<MutexGuard<'_, ChatStore>, ApiError> {
        self.chats
            .lock()
            .map_err(|_| ApiError::Internal("chat store lock poisoned".to_owned()))
    }

    pub fn remote(&self, model: ModelId) -> Result<Arc<RemoteAdapter>, ApiError> {
        self.adapters
            .remote(model)
            .ok_or_else(|| ApiError::Internal(format!("no remote adapter for {model}")))
    }
}
