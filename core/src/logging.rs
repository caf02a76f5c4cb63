use std::collections::VecDeque;
use std::sync::Mutex;

use log::Level;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: String,
    pub ts: i64,
    pub level: String,
    pub code: Option<String>,
    pub module: String,
    pub message: String,
    pub explain: Option<String>,
    pub data: Option<Value>,
}

/// Bounded ring of structured events. Every record is also emitted through
/// the `log` facade as one JSON line under the module target.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    events: Mutex<VecDeque<EventRecord>>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(
        &self,
        level: Level,
        code: Option<&str>,
        module: &str,
        message: &str,
        explain: Option<&str>,
        data: Option<Value>,
    ) -> EventRecord {
        let record = EventRecord {
            id: Uuid::new_v4().to_string(),
            ts: OffsetDateTime::now_utc().unix_timestamp(),
            level: level.as_str().to_ascii_lowercase(),
            code: code.map(str::to_string),
            module: module.to_string(),
            message: message.to_string(),
            explain: explain.map(str::to_string),
            data,
        };

        match serde_json::to_string(&record) {
            Ok(line) => log::log!(target: module, level, "{line}"),
            Err(_) => log::log!(target: module, level, "{message}"),
        }

        if let Ok(mut events) = self.events.lock() {
            if events.len() == self.capacity {
                events.pop_front();
            }
            events.push_back(record.clone());
        }
        record
    }

    /// Most recent events first.
    pub fn recent(&self, limit: Option<usize>) -> Vec<EventRecord> {
        let Ok(events) = self.events.lock() else {
            return Vec::new();
        };
        let take = limit.unwrap_or(events.len());
        events.iter().rev().take(take).cloned().collect()
    }

    /// Recent events for one module, most recent first.
    pub fn recent_for(&self, module: &str, limit: Option<usize>) -> Vec<EventRecord> {
        let mut matching: Vec<EventRecord> = self
            .recent(None)
            .into_iter()
            .filter(|event| event.module == module)
            .collect();
        if let Some(limit) = limit {
            matching.truncate(limit);
        }
        matching
    }
}
