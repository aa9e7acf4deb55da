//! Engine errors

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the execution engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("sequence is empty: generate one first")]
    EmptySequence,

    #[error("a sequence is already running")]
    AlreadyRunning,

    #[error("step '{0}' has no recorded action")]
    UnknownAction(String),

    #[error("invalid run settings: {0}")]
    InvalidSettings(String),

    #[error("executing '{action}' failed: {cause}")]
    ExecutionFailed { action: String, cause: String },
}
