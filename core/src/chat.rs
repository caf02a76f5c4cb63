//! In-memory chat state.
//!
//! Chats are values. Every turn produces a new [`Chat`] through the pure
//! helpers [`append_user_turn`] and [`append_assistant_turn`], and the
//! [`ChatStore`] swaps its whole collection for a fresh one on each mutation.
//! Readers holding an older snapshot keep a consistent view.

use std::collections::HashSet;
use std::sync::Arc;

use log::Level;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::VibesError;
use crate::logging::EventLog;
use crate::models::ModelResponse;

pub const NEW_CHAT_TITLE: &str = "New Chat";
pub const TITLE_MAX_CHARS: usize = 50;
pub const ASSISTANT_TURN_CONTENT: &str = "Here are the responses from different AI models:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Only assistant turns produced by a fan-out carry responses.
    #[serde(rename = "llmResponses", skip_serializing_if = "Option::is_none", default)]
    pub responses: Option<Vec<ModelResponse>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub messages: Vec<Message>,
}

impl Chat {
    pub fn new(at: OffsetDateTime) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), at)
    }

    pub fn with_id(id: impl Into<String>, at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            title: NEW_CHAT_TITLE.to_string(),
            created_at: at,
            updated_at: at,
            messages: Vec::new(),
        }
    }

    fn next_message_id(&self) -> String {
        format!("{}-{}", self.id, self.messages.len())
    }

    fn touched(mut self, at: OffsetDateTime) -> Self {
        self.updated_at = at.max(self.updated_at);
        self
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Append the user's message. The first message of a chat also becomes its
/// title, cut to [`TITLE_MAX_CHARS`] characters, unless the chat was already
/// renamed.
pub fn append_user_turn(chat: &Chat, text: &str, at: OffsetDateTime) -> Result<Chat, VibesError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(VibesError::InvalidPrompt);
    }

    let mut next = chat.clone();
    if next.messages.is_empty() && next.title == NEW_CHAT_TITLE {
        next.title = truncate_chars(text, TITLE_MAX_CHARS);
    }
    let message = Message {
        id: next.next_message_id(),
        content: text.to_string(),
        role: Role::User,
        timestamp: at,
        responses: None,
    };
    next.messages.push(message);
    Ok(next.touched(at))
}

pub fn append_assistant_turn(chat: &Chat, responses: Vec<ModelResponse>, at: OffsetDateTime) -> Chat {
    let mut next = chat.clone();
    let message = Message {
        id: next.next_message_id(),
        content: ASSISTANT_TURN_CONTENT.to_string(),
        role: Role::Assistant,
        timestamp: at,
        responses: Some(responses),
    };
    next.messages.push(message);
    next.touched(at)
}

/// Every chat plus the current selection. New chats go to the front.
///
/// A chat with a user turn awaiting its answers is pending; it accepts no
/// further user turn until the assistant turn lands or the turn is abandoned.
#[derive(Debug)]
pub struct ChatStore {
    chats: Arc<Vec<Chat>>,
    active: Option<String>,
    pending: HashSet<String>,
    events: Arc<EventLog>,
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new(Arc::new(EventLog::default()))
    }
}

impl ChatStore {
    pub fn new(events: Arc<EventLog>) -> Self {
        Self {
            chats: Arc::new(Vec::new()),
            active: None,
            pending: HashSet::new(),
            events,
        }
    }

    pub fn chats(&self) -> Arc<Vec<Chat>> {
        Arc::clone(&self.chats)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Chat> {
        let id = self.active.as_deref()?;
        self.get(id)
    }

    pub fn turn_pending(&self, chat_id: &str) -> bool {
        self.pending.contains(chat_id)
    }

    pub fn get(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    /// Case-insensitive title filter. An empty or blank query returns
    /// everything.
    pub fn search(&self, query: &str) -> Vec<Chat> {
        let needle = query.trim().to_lowercase();
        self.chats
            .iter()
            .filter(|chat| needle.is_empty() || chat.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn create_chat(&mut self, at: OffsetDateTime) -> Chat {
        let chat = Chat::new(at);
        let mut next = Vec::with_capacity(self.chats.len() + 1);
        next.push(chat.clone());
        next.extend(self.chats.iter().cloned());
        self.chats = Arc::new(next);
        self.active = Some(chat.id.clone());

        self.events.record(
            Level::Info,
            Some("CHT-0001"),
            "chat",
            "Chat created",
            None,
            Some(json!({ "chat_id": chat.id })),
        );
        chat
    }

    pub fn select(&mut self, chat_id: &str) -> Result<&Chat, VibesError> {
        if self.get(chat_id).is_none() {
            return Err(VibesError::ChatNotFound(chat_id.to_string()));
        }
        self.active = Some(chat_id.to_string());
        self.get(chat_id)
            .ok_or_else(|| VibesError::ChatNotFound(chat_id.to_string()))
    }

    /// Remove a chat and return the selection afterwards. Deleting the
    /// selected chat moves the selection to the first remaining chat.
    pub fn delete(&mut self, chat_id: &str) -> Result<Option<String>, VibesError> {
        if self.get(chat_id).is_none() {
            return Err(VibesError::ChatNotFound(chat_id.to_string()));
        }
        let remaining: Vec<Chat> = self
            .chats
            .iter()
            .filter(|chat| chat.id != chat_id)
            .cloned()
            .collect();

        self.pending.remove(chat_id);
        if self.active.as_deref() == Some(chat_id) {
            self.active = remaining.first().map(|chat| chat.id.clone());
        }
        self.chats = Arc::new(remaining);

        self.events.record(
            Level::Info,
            Some("CHT-0002"),
            "chat",
            "Chat deleted",
            None,
            Some(json!({ "chat_id": chat_id, "active": self.active })),
        );
        Ok(self.active.clone())
    }

    pub fn apply_user_turn(
        &mut self,
        chat_id: &str,
        text: &str,
        at: OffsetDateTime,
    ) -> Result<Chat, VibesError> {
        let current = self
            .get(chat_id)
            .ok_or_else(|| VibesError::ChatNotFound(chat_id.to_string()))?;
        if self.pending.contains(chat_id) {
            return Err(VibesError::TurnInProgress(chat_id.to_string()));
        }
        let next = append_user_turn(current, text, at)?;
        self.pending.insert(next.id.clone());
        self.replace(next.clone(), Role::User);
        Ok(next)
    }

    pub fn apply_assistant_turn(
        &mut self,
        chat_id: &str,
        responses: Vec<ModelResponse>,
        at: OffsetDateTime,
    ) -> Result<Chat, VibesError> {
        let current = self
            .get(chat_id)
            .ok_or_else(|| VibesError::ChatNotFound(chat_id.to_string()))?;
        let next = append_assistant_turn(current, responses, at);
        self.pending.remove(chat_id);
        self.replace(next.clone(), Role::Assistant);
        Ok(next)
    }

    /// Clear the pending marker after a failed fan-out. The user turn stays.
    pub fn abandon_turn(&mut self, chat_id: &str) {
        if self.pending.remove(chat_id) {
            self.events.record(
                Level::Warn,
                Some("CHT-0004"),
                "chat",
                "Turn abandoned without answers",
                None,
                Some(json!({ "chat_id": chat_id })),
            );
        }
    }

    pub fn rename(
        &mut self,
        chat_id: &str,
        title: &str,
        at: OffsetDateTime,
    ) -> Result<Chat, VibesError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(VibesError::InvalidTitle);
        }
        let mut next = self
            .get(chat_id)
            .cloned()
            .ok_or_else(|| VibesError::ChatNotFound(chat_id.to_string()))?;
        next.title = truncate_chars(title, TITLE_MAX_CHARS);
        let next = next.touched(at);
        self.swap_in(next.clone());
        Ok(next)
    }

    fn replace(&mut self, chat: Chat, role: Role) {
        self.events.record(
            Level::Debug,
            Some("CHT-0003"),
            "chat",
            "Turn appended",
            None,
            Some(json!({
                "chat_id": chat.id,
                "role": role,
                "messages": chat.messages.len(),
            })),
        );
        self.swap_in(chat);
    }

    fn swap_in(&mut self, chat: Chat) {
        let next: Vec<Chat> = self
            .chats
            .iter()
            .map(|existing| {
                if existing.id == chat.id {
                    chat.clone()
                } else {
                    existing.clone()
                }
            })
            .collect();
        self.chats = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, ModelId};
    use time::macros::datetime;
    use time::Duration;

    const T0: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

    #[test]
    fn user_turn_is_pure() {
        let chat = Chat::with_id("c1", T0);
        let before = chat.clone();
        let at = T0 + Duration::seconds(5);

        let first = append_user_turn(&chat, "Hello there", at).unwrap();
        let second = append_user_turn(&chat, "Hello there", at).unwrap();
        assert_eq!(first, second);
        assert_eq!(chat, before);
        assert_eq!(first.messages[0].id, "c1-0");
        assert_eq!(first.messages[0].role, Role::User);
        assert!(first.messages[0].responses.is_none());
        assert_eq!(first.updated_at, at);
    }

    #[test]
    fn first_message_titles_the_chat() {
        let chat = Chat::with_id("c1", T0);
        let long = "a".repeat(80);
        let chat = append_user_turn(&chat, &long, T0).unwrap();
        assert_eq!(chat.title, "a".repeat(50));

        let chat = append_user_turn(&chat, "second question", T0).unwrap();
        assert_eq!(chat.title, "a".repeat(50));
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[1].id, "c1-1");
    }

    #[test]
    fn title_counts_characters_not_bytes() {
        let chat = Chat::with_id("c1", T0);
        let text = "é".repeat(60);
        let chat = append_user_turn(&chat, &text, T0).unwrap();
        assert_eq!(chat.title.chars().count(), 50);
    }

    #[test]
    fn blank_input_is_rejected() {
        let chat = Chat::with_id("c1", T0);
        let err = append_user_turn(&chat, "   \n", T0).unwrap_err();
        assert!(matches!(err, VibesError::InvalidPrompt));
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let chat = Chat::with_id("c1", T0);
        let chat = append_user_turn(&chat, "hi", T0 - Duration::minutes(1)).unwrap();
        assert_eq!(chat.updated_at, T0);
        assert!(chat.updated_at >= chat.created_at);
    }

    #[test]
    fn assistant_turn_carries_responses() {
        let chat = Chat::with_id("c1", T0);
        let chat = append_user_turn(&chat, "hi", T0).unwrap();
        let responses = vec![
            ModelResponse::success(ModelId::Claude, "hello", Confidence::new(88)),
            ModelResponse::failure(ModelId::Gpt4),
        ];
        let chat = append_assistant_turn(&chat, responses.clone(), T0 + Duration::seconds(2));
        let last = chat.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, ASSISTANT_TURN_CONTENT);
        assert_eq!(last.responses.as_ref(), Some(&responses));
    }

    #[test]
    fn message_serialises_with_camel_case_fields() {
        let chat = Chat::with_id("c1", T0);
        let chat = append_assistant_turn(&chat, vec![ModelResponse::failure(ModelId::Llama)], T0);
        let value = serde_json::to_value(&chat).unwrap();
        assert_eq!(value["createdAt"], "2024-05-01T12:00:00Z");
        assert_eq!(value["messages"][0]["llmResponses"][0]["model"], "Llama");

        let user = append_user_turn(&Chat::with_id("c2", T0), "hi", T0).unwrap();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value["messages"][0].get("llmResponses").is_none());
    }

    #[test]
    fn create_inserts_at_front_and_selects() {
        let mut store = ChatStore::default();
        let first = store.create_chat(T0);
        let second = store.create_chat(T0);
        let ids: Vec<String> = store.chats().iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);
        assert_eq!(store.active_id(), Some(second.id.as_str()));
        assert_eq!(second.title, NEW_CHAT_TITLE);
    }

    #[test]
    fn deleting_selected_chat_selects_first_remaining() {
        let mut store = ChatStore::default();
        let a = store.create_chat(T0);
        let b = store.create_chat(T0);
        let c = store.create_chat(T0);
        // order is c, b, a
        store.select(&b.id).unwrap();

        let active = store.delete(&b.id).unwrap();
        assert_eq!(active.as_deref(), Some(c.id.as_str()));
        assert_eq!(store.chats().len(), 2);

        let active = store.delete(&a.id).unwrap();
        assert_eq!(active.as_deref(), Some(c.id.as_str()));

        let active = store.delete(&c.id).unwrap();
        assert!(active.is_none());
        assert!(store.active().is_none());
    }

    #[test]
    fn deleting_unknown_chat_is_an_error() {
        let mut store = ChatStore::default();
        store.create_chat(T0);
        assert!(matches!(store.delete("nope"), Err(VibesError::ChatNotFound(_))));
        assert!(matches!(store.select("nope"), Err(VibesError::ChatNotFound(_))));
    }

    #[test]
    fn mutation_swaps_the_collection() {
        let mut store = ChatStore::default();
        let chat = store.create_chat(T0);
        let snapshot = store.chats();

        let rejected = store.apply_user_turn(&chat.id, " ", T0);
        assert!(matches!(rejected, Err(VibesError::InvalidPrompt)));
        assert!(!store.turn_pending(&chat.id));

        store.apply_user_turn(&chat.id, "climate?", T0).unwrap();
        assert!(snapshot[0].messages.is_empty());
        assert_eq!(store.get(&chat.id).unwrap().messages.len(), 1);
        assert_eq!(store.get(&chat.id).unwrap().title, "climate?");
    }

    #[test]
    fn assistant_turn_for_deleted_chat_is_not_found() {
        let mut store = ChatStore::default();
        let chat = store.create_chat(T0);
        store.apply_user_turn(&chat.id, "hi", T0).unwrap();
        store.delete(&chat.id).unwrap();
        let err = store.apply_assistant_turn(&chat.id, vec![], T0).unwrap_err();
        assert!(matches!(err, VibesError::ChatNotFound(_)));
    }

    #[test]
    fn second_turn_waits_for_answers() {
        let mut store = ChatStore::default();
        let chat = store.create_chat(T0);
        store.apply_user_turn(&chat.id, "climate?", T0).unwrap();
        assert!(store.turn_pending(&chat.id));

        let err = store.apply_user_turn(&chat.id, "pizza?", T0).unwrap_err();
        assert!(matches!(err, VibesError::TurnInProgress(_)));
        assert_eq!(store.get(&chat.id).unwrap().messages.len(), 1);

        store.apply_assistant_turn(&chat.id, vec![], T0).unwrap();
        assert!(!store.turn_pending(&chat.id));
        store.apply_user_turn(&chat.id, "pizza?", T0).unwrap();
        assert_eq!(store.get(&chat.id).unwrap().messages.len(), 3);
    }

    #[test]
    fn abandoned_turn_keeps_user_message() {
        let mut store = ChatStore::default();
        let chat = store.create_chat(T0);
        store.apply_user_turn(&chat.id, "climate?", T0).unwrap();
        store.abandon_turn(&chat.id);
        assert!(!store.turn_pending(&chat.id));
        store.apply_user_turn(&chat.id, "again", T0).unwrap();
        assert_eq!(store.get(&chat.id).unwrap().messages.len(), 2);
    }

    #[test]
    fn other_chats_are_not_blocked() {
        let mut store = ChatStore::default();
        let a = store.create_chat(T0);
        let b = store.create_chat(T0);
        store.apply_user_turn(&a.id, "one", T0).unwrap();
        store.apply_user_turn(&b.id, "two", T0).unwrap();
        assert!(store.turn_pending(&a.id) && store.turn_pending(&b.id));
    }

    #[test]
    fn renamed_empty_chat_keeps_its_title() {
        let mut store = ChatStore::default();
        let chat = store.create_chat(T0);
        store.rename(&chat.id, "Policy notes", T0).unwrap();
        let chat = store.apply_user_turn(&chat.id, "What about climate?", T0).unwrap();
        assert_eq!(chat.title, "Policy notes");
    }

    #[test]
    fn rename_and_search() {
        let mut store = ChatStore::default();
        let a = store.create_chat(T0);
        let b = store.create_chat(T0);
        store.rename(&a.id, "  Climate notes ", T0).unwrap();
        store.rename(&b.id, "Pizza", T0).unwrap();

        let hits = store.search("CLIMATE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Climate notes");
        assert_eq!(store.search("").len(), 2);
        assert!(matches!(store.rename(&a.id, "   ", T0), Err(VibesError::InvalidTitle)));
    }

    #[test]
    fn lifecycle_events_are_recorded() {
        let events = Arc::new(EventLog::default());
        let mut store = ChatStore::new(Arc::clone(&events));
        let chat = store.create_chat(T0);
        store.delete(&chat.id).unwrap();
        let codes: Vec<String> = events
            .recent_for("chat", None)
            .into_iter()
            .filter_map(|e| e.code)
            .collect();
        assert_eq!(codes, vec!["CHT-0002".to_string(), "CHT-0001".to_string()]);
    }
}
