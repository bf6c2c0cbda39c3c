//! Records of embed and extract attempts, delivered to an injected sink.

use std::path::Path;
use std::sync::Mutex;

use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Embed,
    EmbedFailed,
    Extract,
    ExtractFailed,
}

/// One embed or extract attempt, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub action: Action,
    /// the cover medium for embedding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    /// the stego medium for extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationEvent {
    fn new(action: Action) -> Self {
        Self {
            action,
            carrier: None,
            source: None,
            output: None,
            payload_len: None,
            error: None,
        }
    }

    pub fn embedded(carrier: &Path, output: &Path, payload_len: usize) -> Self {
        Self {
            carrier: Some(carrier.display().to_string()),
            output: Some(output.display().to_string()),
            payload_len: Some(payload_len),
            ..Self::new(Action::Embed)
        }
    }

    pub fn embed_failed(carrier: Option<&Path>, error: &dyn std::fmt::Display) -> Self {
        Self {
            carrier: carrier.map(|c| c.display().to_string()),
            error: Some(error.to_string()),
            ..Self::new(Action::EmbedFailed)
        }
    }

    pub fn extracted(source: &Path, output: Option<&Path>, payload_len: usize) -> Self {
        Self {
            source: Some(source.display().to_string()),
            output: output.map(|o| o.display().to_string()),
            payload_len: Some(payload_len),
            ..Self::new(Action::Extract)
        }
    }

    pub fn extract_failed(source: Option<&Path>, error: &dyn std::fmt::Display) -> Self {
        Self {
            source: source.map(|s| s.display().to_string()),
            error: Some(error.to_string()),
            ..Self::new(Action::ExtractFailed)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.action, Action::EmbedFailed | Action::ExtractFailed)
    }
}

/// Receives an event after every attempt. Sinks must not fail the operation.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &OperationEvent);
}

/// Forwards events as JSON to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &OperationEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{event:?} ({e})"));
        if event.is_failure() {
            warn!("{json}");
        } else {
            info!("{json}");
        }
    }
}

/// Keeps events in memory, e.g. for inspection in tests
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<OperationEvent>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<OperationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &OperationEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_left_out() {
        let event = OperationEvent::embedded(Path::new("cover.png"), Path::new("out.png"), 12);

        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"action":"embed","carrier":"cover.png","output":"out.png","payload_len":12}"#
        );
    }

    #[test]
    fn failures_carry_the_error_message() {
        let event = OperationEvent::extract_failed(Some(Path::new("x.wav")), &"bad tag");
        let json = serde_json::to_string(&event).unwrap();

        assert!(event.is_failure());
        assert_eq!(
            json,
            r#"{"action":"extract-failed","source":"x.wav","error":"bad tag"}"#
        );
        assert_eq!(
            serde_json::from_str::<OperationEvent>(&json).unwrap(),
            event
        );
    }

    #[test]
    fn memory_sink_keeps_events_in_order() {
        let sink = MemorySink::default();
        sink.record(&OperationEvent::embed_failed(None, &"no carrier"));
        sink.record(&OperationEvent::extracted(Path::new("a.png"), None, 3));

        let actions: Vec<Action> = sink.events().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![Action::EmbedFailed, Action::Extract]);
    }
}
