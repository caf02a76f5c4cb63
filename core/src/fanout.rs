//! Prompt fan-out across every requested model.
//!
//! The coordinator hides which adapters are remote and which are canned:
//! callers hand it a prompt plus an ordered model list and get back exactly
//! one [`ModelResponse`] per model, in the order they asked for, once every
//! invocation has settled. Slow or failing adapters never cancel their
//! siblings.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use log::Level;
use serde::Serialize;
use serde_json::json;
use tokio::task::JoinSet;

use crate::agents::{AdapterKind, ProviderAdapter};
use crate::errors::VibesError;
use crate::logging::EventLog;
use crate::models::{ModelId, ModelResponse};

type Invocation = Pin<Box<dyn Future<Output = ModelResponse> + Send>>;

/// Detaches whatever is still running when dropped. A plain `JoinSet`
/// aborts its tasks on drop.
struct DetachOnDrop<T: 'static>(JoinSet<T>);

impl<T: 'static> Drop for DetachOnDrop<T> {
    fn drop(&mut self) {
        self.0.detach_all();
    }
}

/// Run every future to completion and return the outputs in input order.
///
/// All tasks are drained even when one of them aborts, so a faulty sibling
/// never cuts the others short. A panic inside any task surfaces as
/// [`VibesError::FanOutFault`] after the join. Dropping the returned future
/// early leaves the spawned tasks running to completion.
pub async fn join_all_ordered<T, F>(tasks: Vec<F>) -> Result<Vec<T>, VibesError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let total = tasks.len();
    let mut join_set = DetachOnDrop(JoinSet::new());
    for (index, task) in tasks.into_iter().enumerate() {
        join_set.0.spawn(async move { (index, task.await) });
    }

    let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut fault: Option<String> = None;
    while let Some(joined) = join_set.0.join_next().await {
        match joined {
            Ok((index, output)) => slots[index] = Some(output),
            Err(err) => {
                fault.get_or_insert_with(|| err.to_string());
            }
        }
    }

    if let Some(message) = fault {
        return Err(VibesError::FanOutFault(message));
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| VibesError::FanOutFault(format!("task {index} produced no output")))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub model: ModelId,
    pub kind: Option<AdapterKind>,
}

#[derive(Clone)]
pub struct FanOutCoordinator {
    adapters: HashMap<ModelId, Arc<dyn ProviderAdapter>>,
    roster: Vec<ModelId>,
    events: Arc<EventLog>,
}

impl FanOutCoordinator {
    /// `roster` is the default model order used by [`Self::ask_roster`].
    /// A later adapter for the same model replaces an earlier one.
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        roster: Vec<ModelId>,
        events: Arc<EventLog>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.model(), adapter))
            .collect();
        Self {
            adapters,
            roster,
            events,
        }
    }

    pub fn roster(&self) -> &[ModelId] {
        &self.roster
    }

    pub fn describe_roster(&self) -> Vec<RosterEntry> {
        self.roster
            .iter()
            .map(|model| RosterEntry {
                model: *model,
                kind: self.adapters.get(model).map(|a| a.kind()),
            })
            .collect()
    }

    pub async fn ask_roster(&self, prompt: &str) -> Result<Vec<ModelResponse>, VibesError> {
        self.ask(prompt, &self.roster).await
    }

    /// Ask each model once, concurrently. The result has one entry per
    /// element of `models`, in the same order.
    pub async fn ask(
        &self,
        prompt: &str,
        models: &[ModelId],
    ) -> Result<Vec<ModelResponse>, VibesError> {
        let started = Instant::now();
        let prompt: Arc<str> = Arc::from(prompt);

        let invocations: Vec<Invocation> = models
            .iter()
            .map(|model| match self.adapters.get(model) {
                Some(adapter) => {
                    let adapter = Arc::clone(adapter);
                    let prompt = Arc::clone(&prompt);
                    Box::pin(async move { adapter.invoke(&prompt).await }) as Invocation
                }
                None => {
                    self.events.record(
                        Level::Warn,
                        Some("AI-0202"),
                        "ai.runtime",
                        "No adapter registered for model",
                        Some("The model is reported as failed for this turn"),
                        Some(json!({ "model": model })),
                    );
                    let failed = ModelResponse::failure(*model);
                    Box::pin(async move { failed }) as Invocation
                }
            })
            .collect();

        let responses = match join_all_ordered(invocations).await {
            Ok(responses) => responses,
            Err(err) => {
                self.events.record(
                    Level::Error,
                    Some("AI-0301"),
                    "ai.runtime",
                    "Fan-out join failed",
                    Some(err.explain()),
                    Some(json!({ "error": err.to_string(), "models": models })),
                );
                return Err(err);
            }
        };

        for response in &responses {
            log_invocation(&self.events, response);
        }
        let failed = responses.iter().filter(|r| r.is_failure()).count();
        self.events.record(
            Level::Info,
            Some("AI-0300"),
            "ai.runtime",
            "Fan-out settled",
            None,
            Some(json!({
                "models": models,
                "failed": failed,
                "elapsed_ms": started.elapsed().as_millis() as u64,
            })),
        );

        Ok(responses)
    }
}

fn log_invocation(events: &EventLog, response: &ModelResponse) {
    if response.is_failure() {
        events.record(
            Level::Warn,
            Some("AI-0201"),
            "ai.runtime",
            "AI provider invocation failed",
            Some("Reported with confidence 0"),
            Some(json!({ "model": response.model })),
        );
    } else {
        let preview = response.response.chars().take(200).collect::<String>();
        events.record(
            Level::Info,
            Some("AI-0200"),
            "ai.runtime",
            "AI provider invocation succeeded",
            None,
            Some(json!({
                "model": response.model,
                "confidence": response.confidence,
                "preview": preview,
            })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::SimulatedAdapter;
    use crate::models::Confidence;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Answers after a fixed delay, optionally as a failure.
    struct Scripted {
        model: ModelId,
        delay_ms: u64,
        fail: bool,
    }

    #[async_trait]
    impl ProviderAdapter for Scripted {
        fn model(&self) -> ModelId {
            self.model
        }

        fn kind(&self) -> AdapterKind {
            AdapterKind::Simulated
        }

        async fn invoke(&self, prompt: &str) -> ModelResponse {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            if self.fail {
                ModelResponse::failure(self.model)
            } else {
                ModelResponse::success(self.model, prompt, Confidence::new(85))
            }
        }
    }

    struct Panicking;

    #[async_trait]
    impl ProviderAdapter for Panicking {
        fn model(&self) -> ModelId {
            ModelId::Llama
        }

        fn kind(&self) -> AdapterKind {
            AdapterKind::Simulated
        }

        async fn invoke(&self, _prompt: &str) -> ModelResponse {
            panic!("adapter bug");
        }
    }

    fn scripted(model: ModelId, delay_ms: u64, fail: bool) -> Arc<dyn ProviderAdapter> {
        Arc::new(Scripted {
            model,
            delay_ms,
            fail,
        })
    }

    fn coordinator(adapters: Vec<Arc<dyn ProviderAdapter>>) -> FanOutCoordinator {
        FanOutCoordinator::new(adapters, ModelId::ALL.to_vec(), Arc::new(EventLog::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn results_follow_request_order_not_completion_order() {
        let fan_out = coordinator(vec![
            scripted(ModelId::Gpt4, 300, false),
            scripted(ModelId::Claude, 10, false),
            scripted(ModelId::Gemini, 200, false),
            scripted(ModelId::Llama, 50, false),
        ]);

        let order = [ModelId::Llama, ModelId::Gpt4, ModelId::Claude, ModelId::Gemini];
        let responses = fan_out.ask("hello", &order).await.unwrap();
        let models: Vec<ModelId> = responses.iter().map(|r| r.model).collect();
        assert_eq!(models, order.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn adapters_run_concurrently() {
        let fan_out = coordinator(vec![
            scripted(ModelId::Gpt4, 1000, false),
            scripted(ModelId::Claude, 1000, false),
            scripted(ModelId::Gemini, 1000, false),
        ]);
        let started = tokio::time::Instant::now();
        fan_out
            .ask("hello", &[ModelId::Gpt4, ModelId::Claude, ModelId::Gemini])
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_keep_their_slot() {
        let fan_out = coordinator(vec![
            scripted(ModelId::Gpt4, 5, true),
            scripted(ModelId::Claude, 50, false),
        ]);
        let responses = fan_out
            .ask("hello", &[ModelId::Gpt4, ModelId::Claude])
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].confidence.value(), 0);
        assert_eq!(responses[1].response, "hello");
    }

    #[tokio::test]
    async fn unregistered_model_becomes_failure_entry() {
        let events = Arc::new(EventLog::default());
        let fan_out = FanOutCoordinator::new(
            vec![scripted(ModelId::Claude, 0, false)],
            vec![ModelId::Claude],
            Arc::clone(&events),
        );
        let responses = fan_out
            .ask("hi", &[ModelId::Gemini, ModelId::Claude])
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].is_failure());
        assert_eq!(responses[0].model, ModelId::Gemini);
        assert!(!responses[1].is_failure());

        let codes: Vec<Option<String>> = events.recent(None).into_iter().map(|e| e.code).collect();
        assert!(codes.contains(&Some("AI-0202".to_string())));
        assert_eq!(codes[0].as_deref(), Some("AI-0300"));
    }

    /// Flags completion after a long sleep.
    struct Slow {
        finished: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ProviderAdapter for Slow {
        fn model(&self) -> ModelId {
            ModelId::Claude
        }

        fn kind(&self) -> AdapterKind {
            AdapterKind::Simulated
        }

        async fn invoke(&self, prompt: &str) -> ModelResponse {
            tokio::time::sleep(Duration::from_millis(1000)).await;
            self.finished.store(true, Ordering::SeqCst);
            ModelResponse::success(ModelId::Claude, prompt, Confidence::new(90))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ask_does_not_cancel_adapters() {
        let finished = Arc::new(AtomicBool::new(false));
        let fan_out = coordinator(vec![Arc::new(Slow {
            finished: Arc::clone(&finished),
        })]);

        let early = tokio::time::timeout(
            Duration::from_millis(10),
            fan_out.ask("hello", &[ModelId::Claude]),
        )
        .await;
        assert!(early.is_err());
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_request_settles_immediately() {
        let fan_out = coordinator(vec![]);
        assert!(fan_out.ask("hi", &[]).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_adapter_is_a_fault_but_siblings_finish() {
        let fan_out = coordinator(vec![scripted(ModelId::Gpt4, 100, false), Arc::new(Panicking)]);
        let err = fan_out
            .ask("hi", &[ModelId::Gpt4, ModelId::Llama])
            .await
            .unwrap_err();
        assert!(matches!(err, VibesError::FanOutFault(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_roster_answers_every_model() {
        let adapters: Vec<Arc<dyn ProviderAdapter>> = ModelId::ALL
            .iter()
            .map(|m| Arc::new(SimulatedAdapter::new(*m)) as Arc<dyn ProviderAdapter>)
            .collect();
        let fan_out = coordinator(adapters);
        let responses = fan_out.ask_roster("ethics of AI").await.unwrap();
        assert_eq!(responses.len(), 4);
        assert!(responses.iter().all(|r| !r.is_failure()));
    }

    #[test]
    fn roster_reports_adapter_kinds() {
        let fan_out = FanOutCoordinator::new(
            vec![scripted(ModelId::Claude, 0, false)],
            vec![ModelId::Claude, ModelId::Gemini],
            Arc::new(EventLog::default()),
        );
        let roster = fan_out.describe_roster();
        assert_eq!(roster[0].kind, Some(AdapterKind::Simulated));
        assert_eq!(roster[1].kind, None);
    }
}
