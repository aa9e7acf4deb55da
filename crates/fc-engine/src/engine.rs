//! Execution engine
//!
//! Runs a sequence on a dedicated tokio task: a short countdown, then each
//! step is handed to the [`Executor`] followed by a (possibly randomized)
//! delay. The loop repeats until stopped, unless the settings ask for a single
//! pass. Progress is reported on the [`EventChannel`].
//!
//! Stopping is cooperative. A stop request sets the run's cancellation flag,
//! which the worker checks before every step and after every delay slice, so
//! a stop takes effect within one slice unless an executor call is in flight.

use fc_core::{Action, CatalogSource, RunId, RunSettings, Sequence};
use fc_event_bus::{EngineEvent, EventChannel, RunEmitter, SharedEventChannel, SubscriptionHandle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::{EngineError, EngineResult};
use crate::executor::Executor;
use crate::state::EngineState;

/// Countdown ticks before the first step
pub const DEFAULT_COUNTDOWN_TICKS: u32 = 3;

/// Length of one countdown tick
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Granularity of delays; bounds stop latency
pub const DEFAULT_SLICE: Duration = Duration::from_millis(100);

/// Timing knobs of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of "Starting in N..." ticks before the first step
    pub countdown_ticks: u32,
    /// Duration of one countdown tick
    pub tick: Duration,
    /// Delays are slept in slices of at most this long
    pub slice: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            tick: DEFAULT_TICK,
            slice: DEFAULT_SLICE,
        }
    }
}

impl EngineConfig {
    /// Start executing immediately
    pub fn without_countdown(mut self) -> Self {
        self.countdown_ticks = 0;
        self
    }

    pub fn with_countdown(mut self, ticks: u32, tick: Duration) -> Self {
        self.countdown_ticks = ticks;
        self.tick = tick;
        self
    }

    pub fn with_slice(mut self, slice: Duration) -> Self {
        self.slice = slice;
        self
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every pass finished without a stop request
    Completed,
    /// Stopped on request
    Cancelled,
    /// The executor failed; later steps were not run
    Failed(EngineError),
}

/// State plus the cancellation flag of the active run
struct Control {
    state: EngineState,
    cancel: Option<Arc<AtomicBool>>,
}

#[derive(Clone)]
struct Shared {
    control: Arc<Mutex<Control>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            control: Arc::new(Mutex::new(Control {
                state: EngineState::Idle,
                cancel: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Control> {
        // Control is two plain fields; a poisoned lock still holds valid data
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state(&self) -> EngineState {
        self.lock().state
    }

    /// Idle → Running, handing out a fresh cancellation flag
    fn begin(&self) -> EngineResult<Arc<AtomicBool>> {
        let mut control = self.lock();
        control.state = control
            .state
            .try_transition(EngineState::Running)
            .map_err(|_| EngineError::AlreadyRunning)?;

        let cancel = Arc::new(AtomicBool::new(false));
        control.cancel = Some(cancel.clone());
        Ok(cancel)
    }

    /// Running → Stopping; false if there was nothing to stop
    fn request_stop(&self) -> bool {
        let mut control = self.lock();
        match control.state.try_transition(EngineState::Stopping) {
            Ok(state) => {
                control.state = state;
                if let Some(cancel) = &control.cancel {
                    cancel.store(true, Ordering::SeqCst);
                }
                true
            }
            Err(e) => {
                trace!("Ignoring stop request: {}", e);
                false
            }
        }
    }

    /// Running/Stopping → Idle
    fn finish(&self) {
        let mut control = self.lock();
        if let Ok(state) = control.state.try_transition(EngineState::Idle) {
            control.state = state;
        }
        control.cancel = None;
    }
}

/// Cloneable handle that stops the active run from any thread
///
/// Hand this to a global key listener or a signal handler.
#[derive(Clone)]
pub struct StopHandle {
    shared: Shared,
}

impl StopHandle {
    /// Request a stop; no-op when nothing is running
    pub fn stop(&self) {
        if self.shared.request_stop() {
            info!("Stop requested");
        }
    }
}

/// Returns the engine to Idle when the worker exits, even by panic
struct IdleGuard(Shared);

impl Drop for IdleGuard {
    fn drop(&mut self) {
        self.0.finish();
        debug!("Engine idle");
    }
}

/// The execution engine
///
/// Only one sequence runs at a time. The catalog is snapshotted at
/// [`start`](Self::start); later recordings affect the next run only.
pub struct ExecutionEngine {
    executor: Arc<dyn Executor>,
    catalog: Arc<dyn CatalogSource>,
    events: SharedEventChannel,
    config: EngineConfig,
    shared: Shared,
    worker: Mutex<Option<JoinHandle<RunOutcome>>>,
}

impl ExecutionEngine {
    /// Create an engine with its own event channel and default timing
    pub fn new(executor: Arc<dyn Executor>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            executor,
            catalog,
            events: Arc::new(EventChannel::new()),
            config: EngineConfig::default(),
            shared: Shared::new(),
            worker: Mutex::new(None),
        }
    }

    /// Use custom timing
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Report on an existing channel
    pub fn with_events(mut self, events: SharedEventChannel) -> Self {
        self.events = events;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.shared.state()
    }

    /// Whether a run is active (running or stopping)
    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    /// The channel progress is reported on
    pub fn events(&self) -> &SharedEventChannel {
        &self.events
    }

    /// Observe progress with a callback
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionHandle
    where
        F: FnMut(&fc_event_bus::Event) + Send + 'static,
    {
        self.events.subscribe_fn(observer)
    }

    /// Handle for stopping runs from outside the engine
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Start running `sequence`
    ///
    /// Preconditions are checked here, before any task is spawned. Must be
    /// called from within a tokio runtime.
    pub fn start(&self, sequence: &Sequence, settings: &RunSettings) -> EngineResult<RunId> {
        if self.state().is_active() {
            return Err(EngineError::AlreadyRunning);
        }
        if sequence.is_empty() {
            return Err(EngineError::EmptySequence);
        }
        settings.validate().map_err(EngineError::InvalidSettings)?;

        let catalog = self.catalog.snapshot();
        let steps = sequence
            .resolve(&catalog)
            .map_err(EngineError::UnknownAction)?;

        let cancel = self.shared.begin()?;
        let run_id = RunId::new();
        info!(run_id = %run_id, steps = steps.len(), "Starting run");

        let run = Run {
            executor: self.executor.clone(),
            config: self.config.clone(),
            settings: settings.clone(),
            steps,
            cancel,
            emitter: self.events.emitter(run_id.clone()),
            rng: StdRng::from_entropy(),
        };
        let guard = IdleGuard(self.shared.clone());
        let handle = tokio::spawn(async move {
            let _guard = guard;
            run.execute().await
        });

        *self.worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(run_id)
    }

    /// Request the active run to stop; no-op when idle
    pub fn cancel(&self) {
        self.stop_handle().stop();
    }

    /// Wait for the most recently started run to exit
    ///
    /// Returns `None` if there is no run to wait for or it was already joined.
    pub async fn join(&self) -> Option<RunOutcome> {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()?;

        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("Run worker ended abnormally: {}", e);
                None
            }
        }
    }
}

/// Result of waiting out a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Elapsed,
    Cancelled,
}

/// Everything one worker needs, owned by the worker task
struct Run {
    executor: Arc<dyn Executor>,
    config: EngineConfig,
    settings: RunSettings,
    steps: Vec<Action>,
    cancel: Arc<AtomicBool>,
    emitter: RunEmitter,
    rng: StdRng,
}

impl Run {
    async fn execute(mut self) -> RunOutcome {
        let outcome = self.run_loop().await;

        match &outcome {
            RunOutcome::Completed => info!(run_id = %self.emitter.run_id(), "Run completed"),
            RunOutcome::Cancelled => info!(run_id = %self.emitter.run_id(), "Run stopped"),
            RunOutcome::Failed(err) => {
                warn!(run_id = %self.emitter.run_id(), error = %err, "Run failed");
                if let EngineError::ExecutionFailed { action, cause } = err {
                    self.emitter.emit(EngineEvent::ExecutionFailed {
                        action: action.clone(),
                        cause: cause.clone(),
                    });
                }
            }
        }

        self.emitter.emit(EngineEvent::StepHighlighted(None));
        self.emitter.emit(EngineEvent::Finished);
        outcome
    }

    async fn run_loop(&mut self) -> RunOutcome {
        for remaining in (1..=self.config.countdown_ticks).rev() {
            if self.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            self.emitter.emit(EngineEvent::StatusMessage(format!(
                "Starting in {}...",
                remaining
            )));
            if self.wait(self.config.tick, false).await == Wait::Cancelled {
                return RunOutcome::Cancelled;
            }
        }

        // Indices refer to the sequence as given, also after reshuffling
        let mut order: Vec<usize> = (0..self.steps.len()).collect();
        let mut pass = 0u64;
        loop {
            pass += 1;
            if self.settings.random_order {
                order.shuffle(&mut self.rng);
            }
            debug!(pass, steps = order.len(), "Starting pass");

            for &index in &order {
                if self.is_cancelled() {
                    return RunOutcome::Cancelled;
                }

                let action = self.steps[index].clone();
                self.emitter.emit(EngineEvent::StatusMessage(format!(
                    "Executing: {}",
                    action.display_name()
                )));
                self.emitter.emit(EngineEvent::StepHighlighted(Some(index)));
                self.emitter.emit(EngineEvent::StepStarted {
                    index,
                    action: action.clone(),
                });

                trace!(index, action = %action, "Performing step");
                if let Err(cause) = self.perform(&action).await {
                    return RunOutcome::Failed(EngineError::ExecutionFailed {
                        action: action.name,
                        cause,
                    });
                }

                let delay = self.next_delay();
                if self.wait(delay, true).await == Wait::Cancelled {
                    return RunOutcome::Cancelled;
                }
                if delay.is_zero() {
                    // Let stop requests and observers in between zero-delay steps
                    tokio::task::yield_now().await;
                }
            }

            if !self.settings.repeat {
                return RunOutcome::Completed;
            }
        }
    }

    /// Hand one action to the executor on its own task
    ///
    /// A panicking executor is reported like a failed call, so the run still
    /// ends with its exit events.
    async fn perform(&self, action: &Action) -> Result<(), String> {
        let executor = self.executor.clone();
        let target = action.clone();
        match tokio::spawn(async move { executor.perform(&target).await }).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) if e.is_panic() => {
                warn!(action = %action.name, "Executor panicked");
                Err("executor panicked".to_string())
            }
            Err(e) => Err(format!("executor task ended: {}", e)),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Delay before the next step, per the run settings
    fn next_delay(&mut self) -> Duration {
        let secs = if self.settings.random_delay {
            let (min, max) = self.settings.delay_range;
            if max > min {
                self.rng.gen_range(min..=max)
            } else {
                min
            }
        } else {
            self.settings.fixed_delay
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Sleep for `delay` in slices, checking for a stop after every slice
    async fn wait(&mut self, delay: Duration, report: bool) -> Wait {
        let started = Instant::now();
        loop {
            if self.is_cancelled() {
                return Wait::Cancelled;
            }
            let elapsed = started.elapsed();
            if elapsed >= delay {
                return Wait::Elapsed;
            }

            let remaining = delay - elapsed;
            if report {
                self.emitter.emit(EngineEvent::StatusMessage(format!(
                    "Next action in {:.1}s",
                    remaining.as_secs_f64()
                )));
            }
            tokio::time::sleep(remaining.min(self.config.slice)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::DryRunExecutor;
    use fc_core::{ActionCatalog, ActionKind, SequenceStep};

    fn engine() -> ExecutionEngine {
        let mut catalog = ActionCatalog::new();
        catalog.record_click("like", 1, 2).unwrap();
        ExecutionEngine::new(Arc::new(DryRunExecutor::new()), Arc::new(catalog))
            .with_config(EngineConfig::default().without_countdown())
    }

    #[test]
    fn test_engine_config_builders() {
        let config = EngineConfig::default()
            .with_countdown(5, Duration::from_millis(10))
            .with_slice(Duration::from_millis(20));
        assert_eq!(config.countdown_ticks, 5);
        assert_eq!(config.tick, Duration::from_millis(10));
        assert_eq!(config.slice, Duration::from_millis(20));
        assert_eq!(EngineConfig::default().slice, DEFAULT_SLICE);
    }

    #[test]
    fn test_shared_state_transitions() {
        let shared = Shared::new();
        assert!(!shared.request_stop());
        assert_eq!(shared.state(), EngineState::Idle);

        let cancel = shared.begin().unwrap();
        assert_eq!(shared.begin().unwrap_err(), EngineError::AlreadyRunning);
        assert!(!cancel.load(Ordering::SeqCst));

        assert!(shared.request_stop());
        assert!(cancel.load(Ordering::SeqCst));
        assert_eq!(shared.state(), EngineState::Stopping);
        assert!(!shared.request_stop());

        shared.finish();
        assert_eq!(shared.state(), EngineState::Idle);
        assert!(shared.begin().is_ok());
    }

    #[tokio::test]
    async fn test_join_without_run() {
        assert_eq!(engine().join().await, None);
    }

    #[tokio::test]
    async fn test_single_pass_completes() {
        let engine = engine();
        let sequence: Sequence = vec![SequenceStep::new("like", ActionKind::Click)].into();

        engine.start(&sequence, &RunSettings::once(0.0)).unwrap();
        assert_eq!(engine.join().await, Some(RunOutcome::Completed));
        assert_eq!(engine.state(), EngineState::Idle);
    }
}
