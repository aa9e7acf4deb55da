//! Executor seam
//!
//! The engine never injects input itself. Platform code (click and scroll
//! primitives) implements [`Executor`] and owns hardware-level error handling;
//! the engine only sees success or an [`ExecutorError`].

use async_trait::async_trait;
use fc_core::{Action, ActionParams};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::info;

/// Errors reported by an executor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutorError {
    /// The platform refused or failed the input call
    #[error("input injection failed: {0}")]
    Injection(String),

    /// The executor cannot perform this kind of action
    #[error("unsupported action: {0}")]
    Unsupported(String),
}

/// Performs actions on the host
#[async_trait]
pub trait Executor: Send + Sync {
    /// Perform one action; the engine waits for this to return
    async fn perform(&self, action: &Action) -> Result<(), ExecutorError>;
}

/// Executor that only logs what it would do
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    performed: AtomicUsize,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actions performed so far
    pub fn performed(&self) -> usize {
        self.performed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for DryRunExecutor {
    async fn perform(&self, action: &Action) -> Result<(), ExecutorError> {
        match action.params {
            ActionParams::Click { pos: (x, y) } => {
                info!(action = %action.name, x, y, "Dry run: click");
            }
            ActionParams::Scroll { amount } => {
                info!(action = %action.name, amount, "Dry run: scroll");
            }
        }
        self.performed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
