//! Per-subscription options and identifiers.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::ExecutionError;

/// Process-wide counter; ids are never reused.
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Unique, monotonically increasing subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked with every execution failure observed by a subscription.
pub type ErrorCallback = Arc<dyn Fn(&ExecutionError) + Send + Sync + 'static>;

/// Who is responsible for ending a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lifecycle {
    /// Unsubscribes automatically when the last handle clone is dropped.
    #[default]
    Caller,
    /// Survives handle drops; must be ended with
    /// [`Subscription::unsubscribe`](crate::Subscription::unsubscribe).
    Extended,
}

/// Options supplied when subscribing.
///
/// ## Field semantics
/// - `interval`: polling period requested by this subscriber (`None` = no polling,
///   a zero duration is treated as `None`)
/// - `on_error`: called after every failed execution of the channel
/// - `lifecycle`: see [`Lifecycle`]
#[derive(Clone, Default)]
pub struct SubscriptionOptions {
    /// Requested polling period.
    pub interval: Option<Duration>,
    /// Failure callback.
    pub on_error: Option<ErrorCallback>,
    /// Ownership of the subscription's end.
    pub lifecycle: Lifecycle,
}

impl SubscriptionOptions {
    /// Options without polling, error callback or extended lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests polling every `interval`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Registers a failure callback.
    pub fn with_on_error(mut self, f: impl Fn(&ExecutionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Sets the lifecycle.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Polling period this subscriber contributes to its channel.
    #[inline]
    pub(crate) fn polling_interval(&self) -> Option<Duration> {
        self.interval.filter(|d| !d.is_zero())
    }
}

impl fmt::Debug for SubscriptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionOptions")
            .field("interval", &self.interval)
            .field("on_error", &self.on_error.is_some())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

/// Options for a manual refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Skip the refresh when the last execution started less than this long ago.
    ///
    /// `Duration::ZERO` (default) never skips.
    pub max_refresh_rate: Duration,
}

impl RefreshOptions {
    /// Refresh at most once per `rate`.
    pub fn at_most_every(rate: Duration) -> Self {
        Self {
            max_refresh_rate: rate,
        }
    }
}
