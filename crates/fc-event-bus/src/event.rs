//! Event types emitted by the execution engine

use chrono::{DateTime, Utc};
use fc_core::{Action, RunId};
use serde::{Deserialize, Serialize};

/// What happened in the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Human-readable progress ("Starting in 3...", "Next action in 1.4s")
    StatusMessage(String),

    /// Step currently being executed, `None` clears the highlight
    StepHighlighted(Option<usize>),

    /// A step is about to be handed to the executor
    StepStarted { index: usize, action: Action },

    /// The executor failed; the run is aborted
    ExecutionFailed { action: String, cause: String },

    /// The run is over; always the last event of a run
    Finished,
}

impl EngineEvent {
    /// Whether this event ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineEvent::Finished)
    }
}

/// An engine event with its run id, position in the run and timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Run that produced the event
    pub run_id: RunId,

    /// Position of the event within its run, starting at 0
    pub seq: u64,

    /// When the event was fired
    pub time_fired: DateTime<Utc>,

    /// The event payload
    pub data: EngineEvent,
}

impl Event {
    /// Create a new event with current timestamp
    pub fn new(run_id: RunId, seq: u64, data: EngineEvent) -> Self {
        Self {
            run_id,
            seq,
            time_fired: Utc::now(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serialization() {
        let value = serde_json::to_value(EngineEvent::StepHighlighted(Some(4))).unwrap();
        assert_eq!(value, json!({"event": "step_highlighted", "data": 4}));

        let value = serde_json::to_value(EngineEvent::ExecutionFailed {
            action: "like".into(),
            cause: "no display".into(),
        })
        .unwrap();
        assert_eq!(value["event"], "execution_failed");
        assert_eq!(value["data"]["cause"], "no display");
    }

    #[test]
    fn test_is_terminal() {
        assert!(EngineEvent::Finished.is_terminal());
        assert!(!EngineEvent::StepHighlighted(None).is_terminal());
    }
}
