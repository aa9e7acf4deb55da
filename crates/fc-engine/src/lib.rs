//! Execution engine for feedclicker
//!
//! Replays a [`Sequence`](fc_core::Sequence) through an [`Executor`] on a
//! background task, reporting progress on an
//! [`EventChannel`](fc_event_bus::EventChannel).
//!
//! ```text
//! Idle ──start()──▶ Running ──stop()──▶ Stopping
//!   ▲                  │                   │
//!   └──── finished ────┴───────────────────┘
//! ```

mod engine;
mod error;
mod executor;
mod state;

pub use engine::{
    EngineConfig, ExecutionEngine, RunOutcome, StopHandle, DEFAULT_COUNTDOWN_TICKS, DEFAULT_SLICE,
    DEFAULT_TICK,
};
pub use error::{EngineError, EngineResult};
pub use executor::{DryRunExecutor, Executor, ExecutorError};
pub use state::{EngineState, InvalidTransition};
