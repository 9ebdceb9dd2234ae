//! # Lifecycle events emitted by the manager and its channels.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Registry events**: channels created/removed by the manager
//! - **Subscription events**: subscriptions attached to / detached from a channel
//! - **Execution events**: execution start, success, failure, refresh requests
//! - **Control events**: pause/resume and late executions
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! channel signature, operation name and subscription id.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use fetchvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ExecutionFailed)
//!     .with_signature("0-[1]")
//!     .with_operation("fetch_user")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::ExecutionFailed);
//! assert_eq!(ev.signature.as_deref(), Some("0-[1]"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `operation`: observer name
    /// - `reason`: panic info/message
    ObserverPanicked,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `operation`: observer name
    /// - `reason`: reason string (e.g., "full", "closed")
    ObserverOverflow,

    // === Registry events ===
    /// A channel was created for a new signature.
    ///
    /// Sets:
    /// - `signature`, `operation`
    ChannelCreated,

    /// A channel lost its last subscriber and was evicted.
    ///
    /// Sets:
    /// - `signature`, `operation`
    ChannelRemoved,

    // === Subscription events ===
    /// A subscription was attached to a channel.
    ///
    /// Sets:
    /// - `signature`, `operation`, `subscription`
    /// - `interval_ms`: effective channel interval after the change (if polling)
    SubscriptionCreated,

    /// A subscription was detached from a channel.
    ///
    /// Sets:
    /// - `signature`, `operation`, `subscription`
    /// - `interval_ms`: effective channel interval after the change (if polling)
    SubscriptionRemoved,

    // === Execution events ===
    /// The operation was invoked (`loading` became true).
    ///
    /// Sets:
    /// - `signature`, `operation`
    ExecutionStarted,

    /// The operation resolved successfully.
    ///
    /// Sets:
    /// - `signature`, `operation`
    /// - `reason`: `"unchanged"` when the response equals the previous one
    ExecutionSucceeded,

    /// The operation failed or panicked; polling stops until a manual refresh.
    ///
    /// Sets:
    /// - `signature`, `operation`
    /// - `reason`: error message
    ExecutionFailed,

    /// A refresh was accepted (manual, timer-driven or queued).
    ///
    /// Sets:
    /// - `signature`, `operation`
    RefreshRequested,

    /// A refresh was ignored because it came sooner than `max_refresh_rate`.
    ///
    /// Sets:
    /// - `signature`, `operation`
    /// - `delay_ms`: time since the last execution
    RefreshDebounced,

    /// A refresh arrived while loading and was queued or dropped.
    ///
    /// Sets:
    /// - `signature`, `operation`
    /// - `reason`: `"queued"` or `"dropped"`
    RefreshQueued,

    // === Control events ===
    /// The channel was paused.
    Paused,

    /// The channel was resumed.
    Resumed,

    /// An execution was requested while paused and deferred until resume.
    LateMarked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Channel signature, if applicable.
    pub signature: Option<Arc<str>>,
    /// Operation (or observer) name, if applicable.
    pub operation: Option<Arc<str>>,
    /// Subscription id, if applicable.
    pub subscription: Option<u64>,
    /// Effective polling interval in milliseconds (compact).
    pub interval_ms: Option<u32>,
    /// Elapsed/delay value in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            signature: None,
            operation: None,
            subscription: None,
            interval_ms: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a channel signature.
    #[inline]
    pub fn with_signature(mut self, signature: impl Into<Arc<str>>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Attaches an operation name.
    #[inline]
    pub fn with_operation(mut self, operation: impl Into<Arc<str>>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Attaches a subscription id.
    #[inline]
    pub fn with_subscription(mut self, id: u64) -> Self {
        self.subscription = Some(id);
        self
    }

    /// Attaches the effective polling interval (stored as milliseconds); `None` is a no-op.
    #[inline]
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval_ms = interval.map(compact_ms);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_operation(observer)
            .with_reason(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_operation(observer)
            .with_reason(info)
    }

    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, EventKind::ObserverOverflow)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::Paused);
        let b = Event::new(EventKind::Resumed);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_durations_are_compacted() {
        let ev = Event::new(EventKind::SubscriptionCreated)
            .with_interval(Some(Duration::from_secs(2)))
            .with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.interval_ms, Some(2000));
        assert_eq!(ev.delay_ms, Some(u32::MAX));

        let none = Event::new(EventKind::SubscriptionRemoved).with_interval(None);
        assert_eq!(none.interval_ms, None);
    }

    #[test]
    fn test_overflow_helper() {
        let ev = Event::observer_overflow("audit", "full");
        assert!(ev.is_observer_overflow());
        assert_eq!(ev.operation.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("observer=audit reason=full"));
    }
}
