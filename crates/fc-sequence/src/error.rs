//! Error types for sequence generation

use thiserror::Error;

/// Result type for sequence generation
pub type GenResult<T> = Result<T, GenError>;

/// Errors that can occur while generating a sequence
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenError {
    /// Not enough recorded actions to build a sequence from
    #[error("at least {required} recorded actions are needed, found {present}")]
    InsufficientActions { required: usize, present: usize },

    /// Every candidate action has weight 0
    #[error("all recorded actions have zero weight")]
    InvalidWeights,

    /// The adjacency rule needed a filler but none is recorded
    #[error("no filler action is recorded (fillers: {fillers:?})")]
    NoFiller { fillers: Vec<String> },

    /// The adjacency rule contradicts itself
    #[error("invalid adjacency rule: {0}")]
    InvalidRule(String),
}
