//! Engine state machine
//!
//! ```text
//! Idle → Running → Stopping → Idle
//!           ↘______________↗
//! ```
//!
//! `Running → Idle` happens when a run completes or fails on its own;
//! `Stopping` is only entered through a stop request.

use std::fmt;
use thiserror::Error;

/// Lifecycle state of the execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineState {
    /// No run in progress
    #[default]
    Idle,
    /// A worker is executing a sequence
    Running,
    /// A stop was requested and the worker has not exited yet
    Stopping,
}

impl EngineState {
    /// Whether a worker is alive
    pub fn is_active(self) -> bool {
        !matches!(self, EngineState::Idle)
    }

    /// Attempt a transition to a new state.
    pub fn try_transition(self, to: EngineState) -> Result<EngineState, InvalidTransition> {
        use EngineState::*;

        let valid = matches!(
            (self, to),
            (Idle, Running) | (Running, Stopping) | (Running, Idle) | (Stopping, Idle)
        );

        if valid {
            Ok(to)
        } else {
            Err(InvalidTransition {
                from: self,
                to,
                reason: Self::transition_error_reason(self, to),
            })
        }
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition_to(self, to: EngineState) -> bool {
        self.try_transition(to).is_ok()
    }

    fn transition_error_reason(from: EngineState, to: EngineState) -> &'static str {
        use EngineState::*;

        match (from, to) {
            (Running, Running) | (Stopping, Running) => "a run is already active",
            (Idle, Stopping) => "nothing to stop",
            (Stopping, Stopping) => "stop already requested",
            (Idle, Idle) => "already idle",
            _ => "invalid state transition",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid state transition from {from} to {to}: {reason}")]
pub struct InvalidTransition {
    pub from: EngineState,
    pub to: EngineState,
    pub reason: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use EngineState::*;

    #[test]
    fn test_valid_transitions() {
        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Stopping));
        assert!(Running.can_transition_to(Idle));
        assert!(Stopping.can_transition_to(Idle));
    }

    #[test]
    fn test_cannot_start_twice() {
        let err = Running.try_transition(Running).unwrap_err();
        assert_eq!(err.reason, "a run is already active");
        assert!(!Stopping.can_transition_to(Running));
    }

    #[test]
    fn test_cannot_stop_idle() {
        assert!(!Idle.can_transition_to(Stopping));
        assert!(!Stopping.can_transition_to(Stopping));
    }

    #[test]
    fn test_is_active() {
        assert!(!Idle.is_active());
        assert!(Running.is_active());
        assert!(Stopping.is_active());
    }
}
