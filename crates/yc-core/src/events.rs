//! Progress event emission.
//!
//! Long-running sampling and sweep loops report progress through a
//! [`ProgressEmitter`] hook passed in by the caller; the computations never
//! print or log on their own. Events are structured so TUI, JSONL, and
//! logging consumers can all hang off the same stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Standard progress event names.
pub mod event_names {
    pub const RUN_STARTED: &str = "run_started";
    pub const RUN_COMPLETE: &str = "run_complete";

    pub const POSTERIOR_STARTED: &str = "posterior_started";
    pub const POSTERIOR_CHAIN_COMPLETE: &str = "posterior_chain_complete";
    pub const POSTERIOR_COMPLETE: &str = "posterior_complete";

    pub const SWEEP_STARTED: &str = "sweep_started";
    pub const SWEEP_LEVEL_COMPLETE: &str = "sweep_level_complete";
    pub const SWEEP_COMPLETE: &str = "sweep_complete";
}

/// High-level pipeline phase for a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Collect,
    Fit,
    Posterior,
    Decide,
    Voi,
    Output,
}

/// Progress counters for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Structured progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, Value>,
}

impl ProgressEvent {
    pub fn new(event: impl Into<String>, phase: Phase) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            phase,
            progress: None,
            details: HashMap::new(),
        }
    }

    pub fn with_progress(mut self, current: u64, total: Option<u64>) -> Self {
        self.progress = Some(Progress { current, total });
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.insert(key.into(), v);
        }
        self
    }

    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Trait for emitting progress events.
pub trait ProgressEmitter: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Emitter that forwards events to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingEmitter;

impl ProgressEmitter for TracingEmitter {
    fn emit(&self, event: ProgressEvent) {
        match &event.progress {
            Some(p) => tracing::info!(
                event = %event.event,
                phase = ?event.phase,
                current = p.current,
                total = p.total,
                "progress"
            ),
            None => tracing::info!(event = %event.event, phase = ?event.phase, "progress"),
        }
    }
}

/// Emitter that collects events in memory. Used by tests and embedders that
/// render their own progress UI.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("emitter lock poisoned").clone()
    }
}

impl ProgressEmitter for CollectingEmitter {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().expect("emitter lock poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_to_jsonl() {
        let event = ProgressEvent::new(event_names::SWEEP_STARTED, Phase::Voi)
            .with_progress(0, Some(5))
            .with_detail("n_batches", 40);
        let line = event.to_jsonl();
        assert!(line.contains("\"sweep_started\""));
        assert!(line.contains("\"voi\""));
        assert!(line.contains("\"n_batches\":40"));
    }

    #[test]
    fn collecting_emitter_preserves_order() {
        let emitter = CollectingEmitter::new();
        emitter.emit(ProgressEvent::new(event_names::RUN_STARTED, Phase::Init));
        emitter.emit(ProgressEvent::new(event_names::RUN_COMPLETE, Phase::Output));
        let events = emitter.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, event_names::RUN_STARTED);
        assert_eq!(events[1].event, event_names::RUN_COMPLETE);
    }
}
