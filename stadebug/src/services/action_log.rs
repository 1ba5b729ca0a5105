use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Append-only sink for user actions. Fire-and-forget: implementations
/// must not fail the caller.
pub trait ActionLog: Send + Sync {
    fn record(&self, actor: &str, action: &str, details: Option<serde_json::Value>);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub actor: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Forwards actions to `tracing` under the `stadebug::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActionLog;

impl ActionLog for TracingActionLog {
    fn record(&self, actor: &str, action: &str, details: Option<serde_json::Value>) {
        let details = details.unwrap_or(serde_json::Value::Null);
        tracing::info!(target: "stadebug::audit", actor, action, %details, "action");
    }
}

/// Keeps entries in memory; mostly useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryActionLog {
    entries: Mutex<Vec<ActionEntry>>,
}

impl MemoryActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActionEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.action).collect()
    }
}

impl ActionLog for MemoryActionLog {
    fn record(&self, actor: &str, action: &str, details: Option<serde_json::Value>) {
        let entry = ActionEntry {
            actor: actor.to_string(),
            action: action.to_string(),
            timestamp: Utc::now(),
            details: details.unwrap_or_else(|| serde_json::json!({})),
        };
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_appends_in_order() {
        let log = MemoryActionLog::new();
        log.record("alice", "Run STA Analysis", None);
        log.record("alice", "Export PDF Report", Some(serde_json::json!({"total_paths": 3})));

        let entries = log.entries();
        assert_eq!(log.actions(), vec!["Run STA Analysis", "Export PDF Report"]);
        assert_eq!(entries[0].details, serde_json::json!({}));
        assert_eq!(entries[1].details["total_paths"], 3);
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_tracing_log_never_panics() {
        TracingActionLog.record("bob", "Export JSON Report", None);
    }
}
