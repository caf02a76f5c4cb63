//! Canned-response adapters for models without a live backend.
//!
//! Each model owns a small lookup table keyed by topic. The prompt is matched
//! case-insensitively: anything mentioning "climate" gets the climate answer,
//! then "ai" or "ethics" get the ethics answer, and everything else falls back
//! to a generic paragraph.

use std::ops::{Range, RangeInclusive};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{AdapterKind, ProviderAdapter};
use crate::models::{Confidence, ModelId, ModelResponse};

pub const DEFAULT_LATENCY_MS: Range<u64> = 1000..3000;
pub const DEFAULT_CONFIDENCE: RangeInclusive<u8> = 80..=99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Climate,
    AiEthics,
    General,
}

pub fn topic_for(prompt: &str) -> Topic {
    let lowered = prompt.to_lowercase();
    if lowered.contains("climate") {
        Topic::Climate
    } else if lowered.contains("ai") || lowered.contains("ethics") {
        Topic::AiEthics
    } else {
        Topic::General
    }
}

#[derive(Debug)]
pub struct CannedReplies {
    pub climate: &'static str,
    pub ai_ethics: &'static str,
    pub general: &'static str,
}

impl CannedReplies {
    pub fn reply(&self, topic: Topic) -> &'static str {
        match topic {
            Topic::Climate => self.climate,
            Topic::AiEthics => self.ai_ethics,
            Topic::General => self.general,
        }
    }
}

static GPT4_REPLIES: CannedReplies = CannedReplies {
    climate: "Climate change requires immediate action through renewable energy transition, carbon pricing, and international cooperation. Key solutions include solar and wind deployment, electric vehicle adoption, and nature-based solutions.",
    ai_ethics: "AI ethics encompasses fairness, transparency, accountability, and privacy. We need robust governance frameworks, diverse development teams, and continuous monitoring of AI systems for bias and harmful outcomes.",
    general: "This is a complex topic that requires careful analysis of multiple perspectives, evidence-based reasoning, and consideration of various stakeholder interests.",
};

static CLAUDE_REPLIES: CannedReplies = CannedReplies {
    climate: "Addressing climate change demands systemic transformation across energy, transportation, and industrial sectors. Effective strategies include carbon capture, sustainable agriculture, and climate adaptation measures.",
    ai_ethics: "Ethical AI development requires transparency in decision-making processes, fairness across different populations, and robust safety measures. Human oversight and explainable AI are crucial components.",
    general: "I approach this question by considering multiple viewpoints and available evidence. The topic involves nuanced considerations that benefit from interdisciplinary analysis.",
};

static GEMINI_REPLIES: CannedReplies = CannedReplies {
    climate: "Tackling climate change calls for rapid decarbonisation of power grids, efficiency gains in buildings and industry, and finance for climate resilience in vulnerable regions.",
    ai_ethics: "Responsible AI rests on clear accountability, privacy by design, and rigorous evaluation for bias before and after deployment, backed by meaningful human review.",
    general: "There are several reasonable ways to look at this. Weighing the strongest evidence on each side usually leads to a more balanced conclusion.",
};

static LLAMA_REPLIES: CannedReplies = CannedReplies {
    climate: "Climate action requires deployment of clean energy, sustainable land use, carbon sequestration, and green infrastructure. Economic incentives and international agreements can accelerate progress.",
    ai_ethics: "Key ethical principles for AI include transparency, fairness, accountability, and respect for human rights. Diverse teams and inclusive design processes help address potential biases.",
    general: "This topic involves multiple dimensions that benefit from comprehensive analysis, considering various perspectives and available research evidence.",
};

pub fn canned_replies(model: ModelId) -> &'static CannedReplies {
    match model {
        ModelId::Gpt4 => &GPT4_REPLIES,
        ModelId::Claude => &CLAUDE_REPLIES,
        ModelId::Gemini => &GEMINI_REPLIES,
        ModelId::Llama => &LLAMA_REPLIES,
    }
}

pub fn canned_reply(model: ModelId, prompt: &str) -> &'static str {
    canned_replies(model).reply(topic_for(prompt))
}

/// Adapter that fakes provider latency and answers from a lookup table.
#[derive(Debug, Clone)]
pub struct SimulatedAdapter {
    model: ModelId,
    latency_ms: Range<u64>,
    confidence: RangeInclusive<u8>,
}

impl SimulatedAdapter {
    pub fn new(model: ModelId) -> Self {
        Self {
            model,
            latency_ms: DEFAULT_LATENCY_MS,
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Override the simulated latency window. An empty range means the
    /// adapter answers after exactly `range.start` milliseconds.
    pub fn with_latency(mut self, range: Range<u64>) -> Self {
        self.latency_ms = range;
        self
    }

    fn draw(&self) -> (Duration, Confidence) {
        let mut rng = rand::rng();
        let delay = if self.latency_ms.is_empty() {
            self.latency_ms.start
        } else {
            rng.random_range(self.latency_ms.clone())
        };
        let confidence = rng.random_range(self.confidence.clone());
        (Duration::from_millis(delay), Confidence::new(confidence))
    }
}

#[async_trait]
impl ProviderAdapter for SimulatedAdapter {
    fn model(&self) -> ModelId {
        self.model
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Simulated
    }

    async fn invoke(&self, prompt: &str) -> ModelResponse {
        let (delay, confidence) = self.draw();
        tokio::time::sleep(delay).await;
        ModelResponse::success(self.model, canned_reply(self.model, prompt), confidence)
    }
}
