//! # Non-blocking event fan-out to multiple observers.
//!
//! Provides [`ObserverSet`], which distributes events to multiple observers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_event()
//!     │    (bounded)         └──────► panic → ObserverPanicked
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► observerN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-observer ordering**: observer A may process event N while B processes N+5
//! - **Overflow**: event dropped for that observer only, `ObserverOverflow` published
//! - **Non-blocking**: `emit_arc()` returns immediately (uses `try_send`)
//! - **Isolation**: a slow/panicking observer doesn't affect others
//! - **Per-observer FIFO**: each observer sees events in order

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::observers::Observer;

/// Per-observer queue metadata.
struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple observers.
pub struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ObserverSet {
    /// Creates a new set and spawns one worker task per observer.
    ///
    /// ### Notes
    /// - Workers start immediately and process events until the set is shut down
    /// - Minimum queue capacity is 1 (enforced)
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observer>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for obs in observers {
            let cap = obs.queue_capacity().max(1);
            let name = obs.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let o = Arc::clone(&obs);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = o.on_event(ev.as_ref());

                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(panic_err.as_ref());
                        tracing::warn!(observer = o.name(), %info, "observer panicked");
                        bus_for_worker.publish(Event::observer_panicked(o.name(), info));
                    }
                }
            });
            channels.push(ObserverChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Returns `true` if the set has no observers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits a pre-allocated `Arc<Event>` to all observers.
    ///
    /// - Uses `try_send` (non-blocking)
    /// - On queue full/closed: drops the event, publishes `ObserverOverflow`
    /// - Overflow events are never re-published when they themselves overflow
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = event.is_observer_overflow();

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !is_overflow_evt {
                self.bus
                    .publish(Event::observer_overflow(channel.name, reason));
            }
        }
    }

    /// Gracefully shuts down all observer workers.
    ///
    /// 1. Drops all queue senders (workers see the queue closed)
    /// 2. Awaits all worker tasks to drain and finish
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
