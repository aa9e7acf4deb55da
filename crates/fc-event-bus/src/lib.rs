//! Event channel between the execution engine and its observers
//!
//! The engine runs on its own task and reports progress here; observers (a
//! UI, a logger, a test harness) subscribe either with a receiver they poll
//! or with a callback that runs on a separate task. Events are ephemeral:
//! nothing is stored once every subscriber has seen them.

mod event;

pub use event::{EngineEvent, Event};

use fc_core::RunId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Default channel capacity for subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// A unique identifier for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One-directional broadcast of engine events
///
/// Every subscriber receives events in emission order. A subscriber that
/// falls more than the channel capacity behind skips the oldest events and
/// keeps going.
pub struct EventChannel {
    sender: broadcast::Sender<Event>,
    next_subscription_id: AtomicU64,
}

impl EventChannel {
    /// Create a new channel
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new channel with the given per-subscriber buffer
    ///
    /// A receiver more than `capacity` events behind loses the oldest ones.
    /// Delivered events stay in emission order; the loss shows up as a gap in
    /// `Event::seq` and in [`EventReceiver::skipped`].
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_subscription_id: AtomicU64::new(1),
        }
    }

    /// Send an event to all current subscribers
    pub fn fire(&self, event: Event) {
        trace!(run_id = %event.run_id, seq = event.seq, event = ?event.data, "Firing event");
        // No receivers is not an error: nobody is watching
        let _ = self.sender.send(event);
    }

    /// Create an emitter that stamps events with `run_id` and a sequence number
    pub fn emitter(self: &Arc<Self>, run_id: RunId) -> RunEmitter {
        RunEmitter {
            channel: self.clone(),
            run_id,
            next_seq: 0,
        }
    }

    /// Subscribe with a receiver
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            rx: self.sender.subscribe(),
            skipped: 0,
        }
    }

    /// Subscribe with a callback
    ///
    /// The observer runs on its own tokio task, so it never blocks the engine.
    /// Must be called from within a tokio runtime. The subscription ends when
    /// the handle is dropped or `unsubscribe` is called.
    pub fn subscribe_fn<F>(&self, mut observer: F) -> SubscriptionHandle
    where
        F: FnMut(&Event) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::SeqCst));
        let mut rx = self.subscribe();

        debug!(subscription = id.0, "Adding observer");
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                observer(&event);
            }
        });

        SubscriptionHandle {
            id,
            task: Some(task),
        }
    }

    /// Number of live receivers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for EventChannel
pub type SharedEventChannel = Arc<EventChannel>;

/// Emits the events of one engine run in order
pub struct RunEmitter {
    channel: Arc<EventChannel>,
    run_id: RunId,
    next_seq: u64,
}

impl RunEmitter {
    /// Emit the next event of this run
    pub fn emit(&mut self, data: EngineEvent) {
        let event = Event::new(self.run_id.clone(), self.next_seq, data);
        self.next_seq += 1;
        self.channel.fire(event);
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }
}

/// Pull-style subscription
pub struct EventReceiver {
    rx: broadcast::Receiver<Event>,
    skipped: u64,
}

impl EventReceiver {
    /// Number of events lost so far because this receiver lagged
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Wait for the next event
    ///
    /// Returns `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Observer lagged by {} events", n);
                    self.skipped += n;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Observer lagged by {} events", n);
                    self.skipped += n;
                }
                Err(_) => return None,
            }
        }
    }

    /// Blocking variant of `recv` for observers living on plain threads
    ///
    /// Panics if called from within an async context.
    pub fn blocking_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.blocking_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Observer lagged by {} events", n);
                    self.skipped += n;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Handle to a callback subscription; dropping it unsubscribes
pub struct SubscriptionHandle {
    id: SubscriptionId,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop delivering events to the observer
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(subscription = self.id.0, "Removing observer");
            task.abort();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
