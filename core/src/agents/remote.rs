use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::config::ProviderSettings;
use super::providers::ProviderKind;
use super::{AdapterKind, ProviderAdapter};
use crate::errors::VibesError;
use crate::models::{Confidence, ModelId, ModelResponse};

/// Confidence attached to every successful remote reply. Providers do not
/// report one, so a fixed value stands in.
pub const REMOTE_REPLY_CONFIDENCE: u8 = 90;

const OPENAI_MAX_TOKENS: u32 = 500;

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("VibesRadar/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to construct HTTP client")
}

/// Adapter that forwards a prompt to a real provider over HTTPS.
#[derive(Debug, Clone)]
pub struct RemoteAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl RemoteAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Send the prompt and return the provider's reply text, keeping the
    /// typed failure. The proxy endpoints need the error; the fan-out path
    /// goes through [`ProviderAdapter::invoke`] instead.
    pub async fn complete(&self, prompt: &str) -> Result<String, VibesError> {
        let provider = self.settings.seed.model;
        let secret = self
            .settings
            .secret
            .as_deref()
            .ok_or(VibesError::MissingCredential {
                provider,
                env_key: self.settings.seed.env_key,
            })?;

        let body = match self.settings.seed.kind {
            ProviderKind::OpenAi => self.chat_openai(secret, prompt).await?,
            ProviderKind::Gemini => self.chat_gemini(secret, prompt).await?,
        };

        let reply = match self.settings.seed.kind {
            ProviderKind::OpenAi => extract_openai_reply(&body),
            ProviderKind::Gemini => extract_gemini_reply(&body),
        };
        reply.ok_or(VibesError::MalformedReply { provider })
    }

    async fn chat_openai(&self, secret: &str, prompt: &str) -> Result<Value, VibesError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let payload = serde_json::json!({
            "model": self.settings.upstream_model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": OPENAI_MAX_TOKENS,
        });
        let request = self.client.post(url).bearer_auth(secret).json(&payload);
        self.send(request).await
    }

    async fn chat_gemini(&self, secret: &str, prompt: &str) -> Result<Value, VibesError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.upstream_model
        );
        let payload = serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", secret)
            .json(&payload);
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, VibesError> {
        let provider = self.settings.seed.model;
        let response = request
            .send()
            .await
            .map_err(|err| VibesError::Transport {
                provider,
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VibesError::Upstream {
                provider,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|_| VibesError::MalformedReply { provider })
    }
}

#[async_trait]
impl ProviderAdapter for RemoteAdapter {
    fn model(&self) -> ModelId {
        self.settings.seed.model
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Remote
    }

    async fn invoke(&self, prompt: &str) -> ModelResponse {
        let model = self.model();
        match self.complete(prompt).await {
            Ok(reply) => {
                ModelResponse::success(model, reply, Confidence::new(REMOTE_REPLY_CONFIDENCE))
            }
            Err(err) => {
                log::warn!(
                    target: "ai.runtime",
                    "[{}] {} adapter failed: {}",
                    err.code(),
                    model,
                    err
                );
                ModelResponse::failure(model)
            }
        }
    }
}

fn extract_openai_reply(body: &Value) -> Option<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|val| val.as_str())
        .map(str::to_string)
}

/// Gemini may split a reply across several parts; they are concatenated.
fn extract_gemini_reply(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|cand| cand.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
